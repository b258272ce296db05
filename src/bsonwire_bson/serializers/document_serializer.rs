// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bson::{Document, RawDocumentBuf};
use crate::serializers::bson_value_serializer::{read_document, write_document};
use crate::serializers::{expect_current_type, BsonSerializer};
use crate::{BsonReader, BsonType, BsonWriter, Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentSerializer;

impl BsonSerializer<Document> for DocumentSerializer {

    fn serialize(&self, writer: &mut BsonWriter<'_>, value: Option<&Document>) -> Result<()> {
        match value {
            Some(doc) => write_document(writer, doc),
            None => writer.write_null(),
        }
    }

    fn deserialize(&self, reader: &mut BsonReader<'_>) -> Result<Document> {
        expect_current_type(reader, BsonType::Document, "Document")?;
        read_document(reader)
    }

}

/// Copies already encoded documents verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawDocumentSerializer;

impl BsonSerializer<RawDocumentBuf> for RawDocumentSerializer {

    fn serialize(&self, writer: &mut BsonWriter<'_>, value: Option<&RawDocumentBuf>) -> Result<()> {
        match value {
            Some(doc) => writer.write_raw_document(doc.as_bytes()),
            None => writer.write_null(),
        }
    }

    fn deserialize(&self, reader: &mut BsonReader<'_>) -> Result<RawDocumentBuf> {
        expect_current_type(reader, BsonType::Document, "RawDocumentBuf")?;
        let bytes = reader.read_raw_document()?;
        RawDocumentBuf::from_bytes(bytes)
            .map_err(|err| Error::InvalidReaderState(err.to_string()))
    }

}
