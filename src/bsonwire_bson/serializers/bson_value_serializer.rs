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

use bson::{Array, Bson, DateTime, Document, Regex};
use crate::serializers::BsonSerializer;
use crate::{BsonReader, BsonType, BsonWriter, Error, Result};

/// Dispatches on the variant of a dynamic [Bson] value.
///
/// At top level only documents are accepted, like everywhere else in the writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct BsonValueSerializer;

impl BsonSerializer<Bson> for BsonValueSerializer {

    fn serialize(&self, writer: &mut BsonWriter<'_>, value: Option<&Bson>) -> Result<()> {
        match value {
            Some(value) => write_bson(writer, value),
            None => writer.write_null(),
        }
    }

    fn deserialize(&self, reader: &mut BsonReader<'_>) -> Result<Bson> {
        read_bson(reader)
    }

}

pub(crate) fn write_bson(writer: &mut BsonWriter<'_>, value: &Bson) -> Result<()> {
    match value {
        Bson::Double(v) => writer.write_double(*v),
        Bson::String(v) => writer.write_string(v),
        Bson::Array(arr) => {
            writer.write_start_array()?;
            for item in arr {
                write_bson(writer, item)?;
            }
            writer.write_end_array()
        }
        Bson::Document(doc) => write_document(writer, doc),
        Bson::Boolean(v) => writer.write_boolean(*v),
        Bson::Null => writer.write_null(),
        Bson::RegularExpression(regex) => {
            writer.write_regular_expression(&regex.pattern, &regex.options)
        }
        Bson::JavaScriptCode(code) => writer.write_javascript(code),
        Bson::JavaScriptCodeWithScope(_) => Err(Error::UnsupportedType(BsonType::JavaScriptWithScope)),
        Bson::Int32(v) => writer.write_int32(*v),
        Bson::Int64(v) => writer.write_int64(*v),
        Bson::Timestamp(ts) => writer.write_timestamp(*ts),
        Bson::Binary(bin) => writer.write_binary(bin.subtype, &bin.bytes),
        Bson::ObjectId(oid) => writer.write_object_id(oid),
        Bson::DateTime(dt) => writer.write_date_time(dt.timestamp_millis()),
        Bson::Symbol(symbol) => writer.write_symbol(symbol),
        Bson::Decimal128(d) => writer.write_decimal128(*d),
        Bson::Undefined => writer.write_undefined(),
        Bson::MaxKey => writer.write_max_key(),
        Bson::MinKey => writer.write_min_key(),
        Bson::DbPointer(_) => Err(Error::UnsupportedType(BsonType::DbPointer)),
    }
}

pub(crate) fn write_document(writer: &mut BsonWriter<'_>, doc: &Document) -> Result<()> {
    writer.write_start_document()?;
    for (key, value) in doc {
        writer.write_name(key)?;
        write_bson(writer, value)?;
    }
    writer.write_end_document()
}

pub(crate) fn read_bson(reader: &mut BsonReader<'_>) -> Result<Bson> {
    let bson_type = reader.peek_current_type()?;
    let value = match bson_type {
        BsonType::Double => Bson::Double(reader.read_double()?),
        BsonType::String => Bson::String(reader.read_string()?),
        BsonType::Document => Bson::Document(read_document(reader)?),
        BsonType::Array => Bson::Array(read_array(reader)?),
        BsonType::Binary => Bson::Binary(reader.read_binary()?),
        BsonType::Undefined => {
            reader.read_undefined()?;
            Bson::Undefined
        }
        BsonType::ObjectId => Bson::ObjectId(reader.read_object_id()?),
        BsonType::Boolean => Bson::Boolean(reader.read_boolean()?),
        BsonType::DateTime => Bson::DateTime(DateTime::from_millis(reader.read_date_time()?)),
        BsonType::Null => {
            reader.read_null()?;
            Bson::Null
        }
        BsonType::RegularExpression => {
            let (pattern, options) = reader.read_regular_expression()?;
            Bson::RegularExpression(Regex { pattern, options })
        }
        BsonType::JavaScript => Bson::JavaScriptCode(reader.read_javascript()?),
        BsonType::Symbol => Bson::Symbol(reader.read_symbol()?),
        BsonType::Int32 => Bson::Int32(reader.read_int32()?),
        BsonType::Timestamp => Bson::Timestamp(reader.read_timestamp()?),
        BsonType::Int64 => Bson::Int64(reader.read_int64()?),
        BsonType::Decimal128 => Bson::Decimal128(reader.read_decimal128()?),
        BsonType::MinKey => {
            reader.read_min_key()?;
            Bson::MinKey
        }
        BsonType::MaxKey => {
            reader.read_max_key()?;
            Bson::MaxKey
        }
        BsonType::EndOfDocument => {
            return Err(Error::InvalidReaderState("no element left in the container".into()));
        }
        BsonType::DbPointer | BsonType::JavaScriptWithScope => {
            return Err(Error::UnsupportedType(bson_type));
        }
    };
    Ok(value)
}

pub(crate) fn read_document(reader: &mut BsonReader<'_>) -> Result<Document> {
    let start = reader.position();
    let depth = reader.depth();
    let result = read_document_inner(reader);
    if result.is_err() {
        reader.rewind(start, depth)?;
    }
    result
}

fn read_document_inner(reader: &mut BsonReader<'_>) -> Result<Document> {
    reader.read_start_document()?;
    let mut doc = Document::new();
    while reader.peek_current_type()? != BsonType::EndOfDocument {
        let name = reader.peek_name()?;
        let value = read_bson(reader)?;
        doc.insert(name, value);
    }
    reader.read_end_document()?;
    Ok(doc)
}

fn read_array(reader: &mut BsonReader<'_>) -> Result<Array> {
    let start = reader.position();
    let depth = reader.depth();
    let result = read_array_inner(reader);
    if result.is_err() {
        reader.rewind(start, depth)?;
    }
    result
}

fn read_array_inner(reader: &mut BsonReader<'_>) -> Result<Array> {
    reader.read_start_array()?;
    let mut arr = Array::new();
    while reader.peek_current_type()? != BsonType::EndOfDocument {
        arr.push(read_bson(reader)?);
    }
    reader.read_end_array()?;
    Ok(arr)
}
