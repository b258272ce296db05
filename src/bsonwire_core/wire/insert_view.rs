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

use bson::Document;
use bsonwire_bson::{BinaryCursor, BsonReader};
use bsonwire_bson::serializers::{BsonSerializer, DocumentSerializer};
use crate::config::InsertFlags;
use crate::{Error, Result};
use super::{Header, OpCode};

/// A decoded OP_INSERT message.
///
/// Documents are kept as encoded bytes; [InsertMessageView::documents]
/// decodes them on demand.
#[derive(Debug, Clone)]
pub struct InsertMessageView {
    pub header: Header,
    pub flags: InsertFlags,
    pub collection_full_name: String,
    pub raw_documents: Vec<Vec<u8>>,
}

impl InsertMessageView {

    pub fn parse(bytes: &[u8]) -> Result<InsertMessageView> {
        let mut cursor = BinaryCursor::from_bytes(bytes.to_vec());
        let header = Header::read_from(&mut cursor)?;
        if header.length < 0 || header.length as usize != bytes.len() {
            return Err(Error::InvalidMessage(format!(
                "header declares {} bytes, got {}", header.length, bytes.len(),
            )));
        }
        if header.op_code != OpCode::Insert {
            return Err(Error::UnexpectedOpCode(header.op_code as i32));
        }

        let flags = InsertFlags::from_bits_truncate(cursor.read_u32()?);
        let collection_full_name = cursor.read_cstring()?;

        let mut raw_documents = Vec::new();
        while cursor.remaining() > 0 {
            let mut reader = BsonReader::new(&mut cursor);
            raw_documents.push(reader.read_raw_document()?);
        }

        Ok(InsertMessageView {
            header,
            flags,
            collection_full_name,
            raw_documents,
        })
    }

    pub fn documents(&self) -> Result<Vec<Document>> {
        let mut result = Vec::with_capacity(self.raw_documents.len());
        for raw in &self.raw_documents {
            let mut cursor = BinaryCursor::from_bytes(raw.clone());
            let mut reader = BsonReader::new(&mut cursor);
            result.push(DocumentSerializer.deserialize(&mut reader)?);
        }
        Ok(result)
    }

}

#[cfg(test)]
mod tests {
    use bson::doc;
    use crate::wire::{InsertMessage, InsertMessageView, OpCode};
    use crate::Error;

    #[test]
    fn test_parse_built_message() {
        let mut message = InsertMessage::new("shop.orders").unwrap();
        message.add_document(&doc! { "sku": "a-1", "qty": 3 }).unwrap();
        message.add_document(&doc! { "sku": "b-2", "tags": ["x", "y"] }).unwrap();
        let bytes = message.finalize().unwrap();

        let view = InsertMessageView::parse(&bytes).unwrap();
        assert_eq!(view.header.op_code, OpCode::Insert);
        assert_eq!(view.header.request_id, message.request_id());
        assert_eq!(view.collection_full_name, "shop.orders");
        assert_eq!(view.raw_documents.len(), 2);
        assert_eq!(view.documents().unwrap(), vec![
            doc! { "sku": "a-1", "qty": 3 },
            doc! { "sku": "b-2", "tags": ["x", "y"] },
        ]);
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        message.add_document(&doc! {}).unwrap();
        let mut bytes = message.finalize().unwrap();
        bytes.push(0);

        let err = InsertMessageView::parse(&bytes).unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(_)));
    }

    #[test]
    fn test_parse_rejects_other_op_code() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        message.add_document(&doc! {}).unwrap();
        let mut bytes = message.finalize().unwrap();
        bytes[12..16].copy_from_slice(&(OpCode::Query as i32).to_le_bytes());

        let err = InsertMessageView::parse(&bytes).unwrap_err();
        assert!(matches!(err, Error::UnexpectedOpCode(2004)));
    }

    #[test]
    fn test_parse_rejects_truncated_document() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        message.add_document(&doc! { "a": 1 }).unwrap();
        let mut bytes = message.finalize().unwrap();
        bytes.pop();
        let len = bytes.len() as i32;
        bytes[0..4].copy_from_slice(&len.to_le_bytes());

        assert!(InsertMessageView::parse(&bytes).is_err());
    }
}
