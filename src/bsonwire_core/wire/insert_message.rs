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

use std::convert::TryFrom;
use std::sync::Arc;
use log::{debug, trace};
use bsonwire_bson::{validate_document_bytes, BinaryCursor, BsonWriter};
use bsonwire_bson::serializers::SerializerRegistry;
use crate::config::InsertFlags;
use crate::{Error, Result};
use super::{next_request_id, Header, OpCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Nothing has been written yet.
    Empty,
    /// The header is written but the message holds no document.
    Building,
    /// At least one document is present.
    Finalizable,
}

/// Assembles an OP_INSERT message in place.
///
/// The header is written on the first document. Every mutation keeps the
/// length field equal to the buffer length, so the bytes can be taken at any
/// point between calls.
pub struct InsertMessage {
    collection_full_name: String,
    flags:                InsertFlags,
    request_id:           i32,
    registry:             Arc<SerializerRegistry>,
    cursor:               Option<BinaryCursor>,
    first_document_start: usize,
    document_starts:      Vec<usize>,
    length_limit:         usize,
}

impl InsertMessage {

    pub fn new(collection_full_name: &str) -> Result<InsertMessage> {
        validate_collection_name(collection_full_name)?;
        Ok(InsertMessage {
            collection_full_name: collection_full_name.to_string(),
            flags: InsertFlags::empty(),
            request_id: next_request_id(),
            registry: SerializerRegistry::global(),
            cursor: None,
            first_document_start: 0,
            document_starts: Vec::new(),
            length_limit: i32::MAX as usize,
        })
    }

    /// Only takes effect before the first document is added.
    pub fn with_flags(mut self, flags: InsertFlags) -> InsertMessage {
        if self.cursor.is_none() {
            self.flags = flags;
        }
        self
    }

    pub fn with_registry(mut self, registry: Arc<SerializerRegistry>) -> InsertMessage {
        self.registry = registry;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_length_limit(mut self, limit: usize) -> InsertMessage {
        self.length_limit = limit.min(i32::MAX as usize);
        self
    }

    #[inline]
    pub fn collection_full_name(&self) -> &str {
        &self.collection_full_name
    }

    #[inline]
    pub fn flags(&self) -> InsertFlags {
        self.flags
    }

    #[inline]
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    #[inline]
    pub fn document_count(&self) -> usize {
        self.document_starts.len()
    }

    /// Total bytes written so far, header included.
    pub fn len(&self) -> usize {
        self.cursor.as_ref().map_or(0, BinaryCursor::len)
    }

    /// True until the header is written, in step with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn has_documents(&self) -> bool {
        !self.document_starts.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.cursor {
            Some(cursor) => cursor.as_bytes(),
            None => &[],
        }
    }

    pub fn state(&self) -> MessageState {
        match (&self.cursor, self.document_starts.is_empty()) {
            (None, _) => MessageState::Empty,
            (Some(_), true) => MessageState::Building,
            (Some(_), false) => MessageState::Finalizable,
        }
    }

    /// Length of the most recently added document.
    pub fn last_document_len(&self) -> Option<usize> {
        let start = *self.document_starts.last()?;
        Some(self.len() - start)
    }

    /// Serializes `document` through the registry and appends it.
    ///
    /// On failure the message is left exactly as it was before the call.
    pub fn add_document<T: 'static>(&mut self, document: &T) -> Result<()> {
        let serializer = self.registry.lookup::<T>()?;
        let was_empty = self.cursor.is_none();
        let limit = self.length_limit;
        self.ensure_started()?;
        let cursor = self.cursor_mut()?;
        cursor.seek_to_end();
        let start = cursor.position();

        let result = {
            let mut writer = BsonWriter::new(cursor);
            serializer.serialize(&mut writer, Some(document))
        }
            .and_then(|_| validate_document_bytes(&cursor.as_bytes()[start..]))
            .map_err(Error::from)
            .and_then(|_| backpatch_length(cursor, limit));

        if let Err(err) = result {
            trace!("rolling back document at offset {}: {}", start, err);
            if was_empty {
                self.cursor = None;
            } else {
                cursor.truncate(start)?;
                backpatch_length(cursor, limit)?;
            }
            return Err(err);
        }

        self.document_starts.push(start);
        trace!(
            "added document {} to '{}', message length: {}",
            self.document_starts.len(), self.collection_full_name, self.len(),
        );
        Ok(())
    }

    /// Appends an already encoded document.
    pub fn add_raw_document(&mut self, bytes: &[u8]) -> Result<()> {
        validate_document_bytes(bytes)?;
        let was_empty = self.cursor.is_none();
        let limit = self.length_limit;
        self.ensure_started()?;
        let cursor = self.cursor_mut()?;
        cursor.seek_to_end();
        let start = cursor.position();
        if let Err(err) = check_length(start + bytes.len(), limit) {
            if was_empty {
                self.cursor = None;
            }
            return Err(err);
        }
        cursor.write_bytes(bytes);
        backpatch_length(cursor, limit)?;
        self.document_starts.push(start);
        Ok(())
    }

    /// Cuts the most recent document off the message and returns its bytes.
    pub fn remove_last_document(&mut self) -> Result<Vec<u8>> {
        let cursor = match self.cursor.as_mut() {
            Some(cursor) => cursor,
            None => return Err(Error::NoDocumentToRemove),
        };
        let start = match self.document_starts.pop() {
            Some(start) => start,
            None => return Err(Error::NoDocumentToRemove),
        };

        let bytes = cursor.as_bytes()[start..].to_vec();
        cursor.truncate(start)?;
        backpatch_length(cursor, i32::MAX as usize)?;

        debug!(
            "removed document of {} bytes from '{}', {} left",
            bytes.len(), self.collection_full_name, self.document_starts.len(),
        );
        Ok(bytes)
    }

    /// Drops every document and starts over with `document` as the only one.
    ///
    /// The message takes a fresh request id, since the bytes built from here
    /// on form a new message on the wire.
    pub fn reset(&mut self, document: &[u8]) -> Result<()> {
        validate_document_bytes(document)?;
        let was_empty = self.cursor.is_none();
        let limit = self.length_limit;
        self.ensure_started()?;
        let start = self.first_document_start;
        if let Err(err) = check_length(start + document.len(), limit) {
            if was_empty {
                self.cursor = None;
            }
            return Err(err);
        }
        let request_id = next_request_id();

        let cursor = self.cursor_mut()?;
        cursor.patch_i32(4, request_id)?;
        cursor.truncate(start)?;
        cursor.seek_to_end();
        cursor.write_bytes(document);
        backpatch_length(cursor, limit)?;

        self.request_id = request_id;
        self.document_starts.clear();
        self.document_starts.push(start);

        debug!(
            "reset message for '{}' with request id {}",
            self.collection_full_name, request_id,
        );
        Ok(())
    }

    /// Copies out the finished message.
    pub fn finalize(&self) -> Result<Vec<u8>> {
        match &self.cursor {
            Some(cursor) => Ok(cursor.as_bytes().to_vec()),
            None => Err(Error::InvalidMessage("no document has been added".into())),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self.cursor {
            Some(cursor) => Ok(cursor.into_inner()),
            None => Err(Error::InvalidMessage("no document has been added".into())),
        }
    }

    /// Writes the header and the fixed body fields on first use.
    fn ensure_started(&mut self) -> Result<()> {
        if self.cursor.is_some() {
            return Ok(());
        }
        let mut cursor = BinaryCursor::with_capacity(
            Header::LENGTH + 4 + self.collection_full_name.len() + 1,
        );
        let header = Header {
            length: 0,
            request_id: self.request_id,
            response_to: 0,
            op_code: OpCode::Insert,
        };
        header.write_to(&mut cursor)?;
        cursor.write_i32(self.flags.bits() as i32)?;
        cursor.write_cstring(&self.collection_full_name)?;
        backpatch_length(&mut cursor, self.length_limit)?;

        self.first_document_start = cursor.position();
        self.cursor = Some(cursor);
        debug!(
            "started insert message {} for '{}'",
            self.request_id, self.collection_full_name,
        );
        Ok(())
    }

    fn cursor_mut(&mut self) -> Result<&mut BinaryCursor> {
        match self.cursor.as_mut() {
            Some(cursor) => Ok(cursor),
            None => Err(Error::InvalidMessage("message has not been started".into())),
        }
    }

}

fn check_length(size: usize, limit: usize) -> Result<()> {
    if size > limit {
        return Err(Error::MessageTooLarge { size, max: limit });
    }
    Ok(())
}

/// Writes the buffer length into the header. A buffer over `limit` is left
/// untouched and reported, so the caller can roll back.
fn backpatch_length(cursor: &mut BinaryCursor, limit: usize) -> Result<()> {
    check_length(cursor.len(), limit)?;
    let length = i32::try_from(cursor.len()).map_err(|_| Error::MessageTooLarge {
        size: cursor.len(),
        max: i32::MAX as usize,
    })?;
    cursor.patch_i32(0, length)?;
    Ok(())
}

fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidCollectionName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use bson::{doc, Document};
    use bsonwire_bson::{BsonReader, BsonWriter, MinKey};
    use bsonwire_bson::serializers::{BsonSerializer, SerializerRegistry};
    use crate::config::InsertFlags;
    use crate::wire::{InsertMessage, MessageState};
    use crate::Error;

    fn header_length(bytes: &[u8]) -> usize {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
    }

    struct HalfWritten;

    struct HalfWrittenSerializer;

    impl BsonSerializer<HalfWritten> for HalfWrittenSerializer {
        fn serialize(
            &self,
            writer: &mut BsonWriter<'_>,
            _value: Option<&HalfWritten>,
        ) -> bsonwire_bson::Result<()> {
            writer.write_start_document()?;
            writer.write_name("a")?;
            writer.write_int32(1)?;
            Err(bsonwire_bson::Error::InvalidWriterState("gave up".into()))
        }

        fn deserialize(&self, _reader: &mut BsonReader<'_>) -> bsonwire_bson::Result<HalfWritten> {
            Ok(HalfWritten)
        }
    }

    #[test]
    fn test_empty_document_message() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        assert_eq!(message.state(), MessageState::Empty);
        assert_eq!(message.len(), 0);

        message.add_document(&Document::new()).unwrap();
        assert_eq!(message.state(), MessageState::Finalizable);

        let bytes = message.finalize().unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(header_length(&bytes), 33);
        assert_eq!(&bytes[12..16], &2002i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &[0, 0, 0, 0]);
        assert_eq!(&bytes[20..28], b"db.coll\0");
        assert_eq!(&bytes[28..], &[5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_length_follows_every_add() {
        let mut message = InsertMessage::new("test.people").unwrap();
        for i in 0..10 {
            message.add_document(&doc! { "i": i, "name": "x".repeat(i as usize) }).unwrap();
            assert_eq!(header_length(message.as_bytes()), message.len());
        }
        assert_eq!(message.document_count(), 10);
    }

    #[test]
    fn test_remove_last_restores_previous_length() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        message.add_document(&doc! { "a": 1 }).unwrap();
        let after_first = message.finalize().unwrap();

        message.add_document(&doc! { "b": "two" }).unwrap();
        let removed = message.remove_last_document().unwrap();

        assert_eq!(removed, bson::to_vec(&doc! { "b": "two" }).unwrap());
        assert_eq!(message.finalize().unwrap(), after_first);
        assert_eq!(message.document_count(), 1);
    }

    #[test]
    fn test_remove_then_add_is_identical() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        message.add_document(&doc! { "a": 1 }).unwrap();
        message.add_document(&doc! { "b": 2 }).unwrap();
        let before = message.finalize().unwrap();

        message.remove_last_document().unwrap();
        message.add_document(&doc! { "b": 2 }).unwrap();
        assert_eq!(message.finalize().unwrap(), before);
    }

    #[test]
    fn test_consecutive_removals() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        message.add_document(&doc! { "a": 1 }).unwrap();
        let after_first = message.finalize().unwrap();
        message.add_document(&doc! { "b": 2 }).unwrap();
        message.add_document(&doc! { "c": 3 }).unwrap();

        assert_eq!(
            message.remove_last_document().unwrap(),
            bson::to_vec(&doc! { "c": 3 }).unwrap(),
        );
        assert_eq!(
            message.remove_last_document().unwrap(),
            bson::to_vec(&doc! { "b": 2 }).unwrap(),
        );
        assert_eq!(message.finalize().unwrap(), after_first);

        message.remove_last_document().unwrap();
        assert_eq!(message.state(), MessageState::Building);
        assert_eq!(message.len(), 28);
        assert_eq!(header_length(message.as_bytes()), 28);

        let err = message.remove_last_document().unwrap_err();
        assert!(matches!(err, Error::NoDocumentToRemove));
    }

    #[test]
    fn test_remove_from_empty_message() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        let err = message.remove_last_document().unwrap_err();
        assert!(matches!(err, Error::NoDocumentToRemove));
        assert_eq!(message.state(), MessageState::Empty);
    }

    #[test]
    fn test_reset_keeps_one_document() {
        let replacement = bson::to_vec(&doc! { "only": true }).unwrap();
        for n in 1..=5 {
            let mut message = InsertMessage::new("db.coll").unwrap();
            for i in 0..n {
                message.add_document(&doc! { "i": i }).unwrap();
            }
            let old_request_id = message.request_id();

            message.reset(&replacement).unwrap();

            let bytes = message.finalize().unwrap();
            assert_eq!(message.document_count(), 1);
            assert_eq!(bytes.len(), 28 + replacement.len());
            assert_eq!(header_length(&bytes), bytes.len());
            assert_eq!(&bytes[28..], replacement.as_slice());

            assert_ne!(message.request_id(), old_request_id);
            assert_eq!(&bytes[4..8], &message.request_id().to_le_bytes());

            assert_eq!(
                message.remove_last_document().unwrap(),
                replacement,
                "reset after {} documents",
                n,
            );
            assert!(!message.has_documents());
        }
    }

    #[test]
    fn test_failed_add_rolls_back() {
        let registry = Arc::new(SerializerRegistry::with_defaults());
        registry
            .register::<HalfWritten, _>(|| Arc::new(HalfWrittenSerializer))
            .unwrap();
        let mut message = InsertMessage::new("db.coll")
            .unwrap()
            .with_registry(registry);

        // first add fails: nothing was written before
        assert!(message.add_document(&HalfWritten).is_err());
        assert_eq!(message.state(), MessageState::Empty);

        message.add_document(&doc! { "a": 1 }).unwrap();
        let before = message.finalize().unwrap();

        let err = message.add_document(&HalfWritten).unwrap_err();
        assert!(matches!(err, Error::Bson(bsonwire_bson::Error::InvalidWriterState(_))));
        assert_eq!(message.finalize().unwrap(), before);
        assert_eq!(message.document_count(), 1);
    }

    #[test]
    fn test_oversized_message_is_left_untouched() {
        let first = bson::to_vec(&doc! { "a": 1 }).unwrap();
        // room for the header and exactly one such document
        let limit = 28 + first.len();
        let mut message = InsertMessage::new("db.coll")
            .unwrap()
            .with_length_limit(limit);

        message.add_document(&doc! { "a": 1 }).unwrap();
        let before = message.finalize().unwrap();
        assert_eq!(before.len(), limit);

        let err = message.add_document(&doc! { "b": 2 }).unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { max, .. } if max == limit));
        assert_eq!(message.finalize().unwrap(), before);
        assert_eq!(header_length(message.as_bytes()), limit);
        assert_eq!(message.document_count(), 1);

        let err = message.add_raw_document(&first).unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { .. }));
        assert_eq!(message.finalize().unwrap(), before);
        assert_eq!(message.document_count(), 1);

        let bigger = bson::to_vec(&doc! { "a": "longer" }).unwrap();
        let old_request_id = message.request_id();
        let err = message.reset(&bigger).unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { .. }));
        assert_eq!(message.finalize().unwrap(), before);
        assert_eq!(message.request_id(), old_request_id);

        // a message too small for even one document stays empty
        let mut message = InsertMessage::new("db.coll")
            .unwrap()
            .with_length_limit(30);
        assert!(message.add_document(&doc! { "a": 1 }).is_err());
        assert!(message.add_raw_document(&first).is_err());
        assert_eq!(message.state(), MessageState::Empty);
        assert!(message.is_empty());
    }

    #[test]
    fn test_emptiness_follows_length() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        assert!(message.is_empty());
        assert!(!message.has_documents());

        message.add_document(&doc! { "a": 1 }).unwrap();
        assert!(!message.is_empty());
        assert!(message.has_documents());

        message.remove_last_document().unwrap();
        assert_eq!(message.state(), MessageState::Building);
        assert_eq!(message.len(), 28);
        assert!(!message.is_empty());
        assert!(!message.has_documents());
    }

    #[test]
    fn test_scalar_is_not_a_document() {
        let mut message = InsertMessage::new("db.coll").unwrap();
        message.add_document(&doc! { "a": 1 }).unwrap();
        let before = message.finalize().unwrap();

        assert!(message.add_document(&MinKey).is_err());
        assert!(message.add_document(&42i32).is_err());
        assert_eq!(message.finalize().unwrap(), before);
    }

    #[test]
    fn test_unknown_document_type() {
        struct Unregistered;
        let mut message = InsertMessage::new("db.coll").unwrap();
        let err = message.add_document(&Unregistered).unwrap_err();
        assert!(matches!(err, Error::Bson(bsonwire_bson::Error::SerializerNotFound(_))));
        assert_eq!(message.state(), MessageState::Empty);
    }

    #[test]
    fn test_flags_and_raw_documents() {
        let mut message = InsertMessage::new("db.coll")
            .unwrap()
            .with_flags(InsertFlags::CONTINUE_ON_ERROR);
        let raw = bson::to_vec(&doc! { "raw": 1 }).unwrap();
        message.add_raw_document(&raw).unwrap();

        let bytes = message.into_bytes().unwrap();
        assert_eq!(&bytes[16..20], &[1, 0, 0, 0]);
        assert_eq!(&bytes[28..], raw.as_slice());

        let mut message = InsertMessage::new("db.coll").unwrap();
        let err = message.add_raw_document(&[6, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::Bson(_)));
        assert_eq!(message.state(), MessageState::Empty);
    }

    #[test]
    fn test_invalid_collection_name() {
        assert!(matches!(
            InsertMessage::new("").err().unwrap(),
            Error::InvalidCollectionName(_),
        ));
        assert!(matches!(
            InsertMessage::new("db\0coll").err().unwrap(),
            Error::InvalidCollectionName(_),
        ));
    }

    #[test]
    fn test_finalize_before_any_document() {
        let message = InsertMessage::new("db.coll").unwrap();
        assert!(matches!(message.finalize().unwrap_err(), Error::InvalidMessage(_)));
    }
}
