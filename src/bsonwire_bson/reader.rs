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

use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{Binary, Decimal128, Timestamp};
use smallvec::{SmallVec, smallvec};
use crate::writer::ContainerKind;
use crate::{BinaryCursor, BsonType, Error, Result};

struct ReaderContext {
    kind: ContainerKind,
    // offset of the length field
    start: usize,
    // one past the terminator
    end: usize,
}

/// Consumes the BSON token stream from a [BinaryCursor].
///
/// Every `read_*` call checks the tag before consuming anything. If a call
/// fails, the cursor is rewound to where the call started.
pub struct BsonReader<'a> {
    cursor: &'a mut BinaryCursor,
    stack: SmallVec<[ReaderContext; 8]>,
    current_name: Option<String>,
}

impl<'a> BsonReader<'a> {

    pub fn new(cursor: &'a mut BinaryCursor) -> BsonReader<'a> {
        BsonReader {
            cursor,
            stack: smallvec![],
            current_name: None,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.stack.is_empty()
    }

    /// Name of the element consumed last.
    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    /// Returns the tag at the position without consuming it.
    ///
    /// At top level the only value is a document. At the end of a
    /// container [BsonType::EndOfDocument] is returned.
    pub fn peek_current_type(&self) -> Result<BsonType> {
        if self.is_top_level() {
            if self.cursor.remaining() == 0 {
                return Err(Error::UnexpectedEnd {
                    needed: 1,
                    remaining: 0,
                });
            }
            return Ok(BsonType::Document);
        }
        let (start, end) = match self.stack.last() {
            Some(ctx) => (ctx.start, ctx.end),
            None => return Err(Error::InvalidReaderState("no open container".into())),
        };
        let position = self.cursor.position();
        if position >= end {
            return Err(Error::UnexpectedEnd {
                needed: 1,
                remaining: 0,
            });
        }
        let tag = self.cursor.peek_u8()?;
        // only the last byte of a container may be its terminator
        if (tag == 0) != (position == end - 1) {
            return Err(Error::InvalidLength((end - start) as i32));
        }
        BsonType::from_tag(tag)
    }

    /// Name of the element at the position, without consuming it.
    pub fn peek_name(&mut self) -> Result<String> {
        match self.peek_current_type()? {
            BsonType::EndOfDocument => {
                return Err(Error::InvalidReaderState("no element left in the container".into()));
            }
            _ if self.is_top_level() => {
                return Err(Error::InvalidReaderState("top level document has no name".into()));
            }
            _ => (),
        }
        let start = self.cursor.position();
        let result = self.cursor.read_u8().and_then(|_| self.cursor.read_cstring());
        self.cursor.seek(start)?;
        result
    }

    pub fn read_start_document(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Document)?;
            reader.push_container(ContainerKind::Document)
        })
    }

    pub fn read_end_document(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| reader.pop_container(ContainerKind::Document))
    }

    pub fn read_start_array(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Array)?;
            reader.push_container(ContainerKind::Array)
        })
    }

    pub fn read_end_array(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| reader.pop_container(ContainerKind::Array))
    }

    /// Copies the next document out without decoding its elements.
    pub fn read_raw_document(&mut self) -> Result<Vec<u8>> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Document)?;
            let start = reader.cursor.position();
            let len = reader.cursor.read_i32()?;
            reader.cursor.seek(start)?;
            if len < 5 {
                return Err(Error::InvalidLength(len));
            }
            let bytes = reader.cursor.read_bytes(len as usize)?.to_vec();
            crate::writer::validate_raw_document(&bytes)?;
            Ok(bytes)
        })
    }

    pub fn read_double(&mut self) -> Result<f64> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Double)?;
            reader.cursor.read_f64()
        })
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::String)?;
            reader.cursor.read_string()
        })
    }

    pub fn read_binary(&mut self) -> Result<Binary> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Binary)?;
            let len = reader.cursor.read_i32()?;
            if len < 0 {
                return Err(Error::InvalidLength(len));
            }
            let subtype = BinarySubtype::from(reader.cursor.read_u8()?);
            let len = if subtype == BinarySubtype::BinaryOld {
                let inner = reader.cursor.read_i32()?;
                if inner < 0 || inner.checked_add(4) != Some(len) {
                    return Err(Error::InvalidLength(inner));
                }
                inner
            } else {
                len
            };
            let bytes = reader.cursor.read_bytes(len as usize)?.to_vec();
            Ok(Binary { subtype, bytes })
        })
    }

    pub fn read_undefined(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| reader.read_element_header(BsonType::Undefined))
    }

    pub fn read_object_id(&mut self) -> Result<ObjectId> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::ObjectId)?;
            let mut bytes = [0u8; 12];
            bytes.copy_from_slice(reader.cursor.read_bytes(12)?);
            Ok(ObjectId::from_bytes(bytes))
        })
    }

    pub fn read_boolean(&mut self) -> Result<bool> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Boolean)?;
            match reader.cursor.read_u8()? {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(Error::InvalidReaderState(format!("invalid boolean byte: {}", other))),
            }
        })
    }

    pub fn read_date_time(&mut self) -> Result<i64> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::DateTime)?;
            reader.cursor.read_i64()
        })
    }

    pub fn read_null(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| reader.read_element_header(BsonType::Null))
    }

    /// Returns `(pattern, options)`.
    pub fn read_regular_expression(&mut self) -> Result<(String, String)> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::RegularExpression)?;
            let pattern = reader.cursor.read_cstring()?;
            let options = reader.cursor.read_cstring()?;
            Ok((pattern, options))
        })
    }

    pub fn read_javascript(&mut self) -> Result<String> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::JavaScript)?;
            reader.cursor.read_string()
        })
    }

    pub fn read_symbol(&mut self) -> Result<String> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Symbol)?;
            reader.cursor.read_string()
        })
    }

    pub fn read_int32(&mut self) -> Result<i32> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Int32)?;
            reader.cursor.read_i32()
        })
    }

    pub fn read_timestamp(&mut self) -> Result<Timestamp> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Timestamp)?;
            let increment = reader.cursor.read_u32()?;
            let time = reader.cursor.read_u32()?;
            Ok(Timestamp { time, increment })
        })
    }

    pub fn read_int64(&mut self) -> Result<i64> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Int64)?;
            reader.cursor.read_i64()
        })
    }

    pub fn read_decimal128(&mut self) -> Result<Decimal128> {
        self.rewind_on_err(|reader| {
            reader.read_element_header(BsonType::Decimal128)?;
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(reader.cursor.read_bytes(16)?);
            Ok(Decimal128::from_bytes(bytes))
        })
    }

    pub fn read_min_key(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| reader.read_element_header(BsonType::MinKey))
    }

    pub fn read_max_key(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| reader.read_element_header(BsonType::MaxKey))
    }

    /// Consumes the next element whatever its type is.
    pub fn skip_value(&mut self) -> Result<()> {
        self.rewind_on_err(|reader| {
            let ty = reader.peek_current_type()?;
            match ty {
                BsonType::EndOfDocument => {
                    Err(Error::InvalidReaderState("no element left in the container".into()))
                }
                BsonType::Document | BsonType::Array => {
                    let kind = if ty == BsonType::Document {
                        ContainerKind::Document
                    } else {
                        ContainerKind::Array
                    };
                    reader.read_element_header(ty)?;
                    reader.push_container(kind)?;
                    let end = match reader.stack.last() {
                        Some(ctx) => ctx.end,
                        None => return Err(Error::InvalidReaderState("no open container".into())),
                    };
                    reader.cursor.seek(end - 1)?;
                    reader.pop_container(kind)
                }
                BsonType::Double => reader.read_double().map(|_| ()),
                BsonType::String => reader.read_string().map(|_| ()),
                BsonType::Binary => reader.read_binary().map(|_| ()),
                BsonType::Undefined => reader.read_undefined(),
                BsonType::ObjectId => reader.read_object_id().map(|_| ()),
                BsonType::Boolean => reader.read_boolean().map(|_| ()),
                BsonType::DateTime => reader.read_date_time().map(|_| ()),
                BsonType::Null => reader.read_null(),
                BsonType::RegularExpression => reader.read_regular_expression().map(|_| ()),
                BsonType::JavaScript => reader.read_javascript().map(|_| ()),
                BsonType::Symbol => reader.read_symbol().map(|_| ()),
                BsonType::Int32 => reader.read_int32().map(|_| ()),
                BsonType::Timestamp => reader.read_timestamp().map(|_| ()),
                BsonType::Int64 => reader.read_int64().map(|_| ()),
                BsonType::Decimal128 => reader.read_decimal128().map(|_| ()),
                BsonType::MinKey => reader.read_min_key(),
                BsonType::MaxKey => reader.read_max_key(),
                BsonType::DbPointer | BsonType::JavaScriptWithScope => {
                    Err(Error::UnsupportedType(ty))
                }
            }
        })
    }

    fn rewind_on_err<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BsonReader<'a>) -> Result<T>,
    {
        let start = self.cursor.position();
        let depth = self.stack.len();
        let name = self.current_name.clone();
        let result = f(self).and_then(|value| {
            self.check_within_container(depth)?;
            Ok(value)
        });
        if result.is_err() {
            self.rewind(start, depth)?;
            self.current_name = name;
        }
        result
    }

    /// An element read inside a container must end before its terminator.
    fn check_within_container(&self, depth: usize) -> Result<()> {
        if depth == 0 || self.stack.len() < depth {
            return Ok(());
        }
        let ctx = &self.stack[depth - 1];
        if self.cursor.position() >= ctx.end {
            return Err(Error::InvalidLength((ctx.end - ctx.start) as i32));
        }
        Ok(())
    }

    /// Restores a position and container depth observed earlier.
    pub(crate) fn rewind(&mut self, position: usize, depth: usize) -> Result<()> {
        self.cursor.seek(position)?;
        self.stack.truncate(depth);
        Ok(())
    }

    fn read_element_header(&mut self, expected: BsonType) -> Result<()> {
        let actual = self.peek_current_type()?;
        if actual != expected {
            return Err(Error::TypeMismatch {
                expected,
                actual,
            });
        }
        if self.is_top_level() {
            return Ok(());
        }
        self.cursor.read_u8()?;
        let name = self.cursor.read_cstring()?;
        self.current_name = Some(name);
        Ok(())
    }

    fn push_container(&mut self, kind: ContainerKind) -> Result<()> {
        let start = self.cursor.position();
        let len = self.cursor.read_i32()?;
        if len < 5 {
            return Err(Error::InvalidLength(len));
        }
        let end = start + len as usize;
        if let Some(parent) = self.stack.last() {
            // leave room for the parent's terminator
            if end >= parent.end {
                return Err(Error::InvalidLength(len));
            }
        }
        if end > self.cursor.len() {
            return Err(Error::UnexpectedEnd {
                needed: end - start,
                remaining: self.cursor.len() - start,
            });
        }
        self.stack.push(ReaderContext {
            kind,
            start,
            end,
        });
        Ok(())
    }

    fn pop_container(&mut self, kind: ContainerKind) -> Result<()> {
        let (start, end) = match self.stack.last() {
            Some(ctx) if ctx.kind == kind => (ctx.start, ctx.end),
            _ => return Err(Error::InvalidReaderState(format!("no open {:?} to end", kind))),
        };
        let terminator = self.cursor.read_u8()?;
        if terminator != 0 || self.cursor.position() != end {
            return Err(Error::InvalidLength((end - start) as i32));
        }
        self.stack.pop();
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use bson::doc;
    use crate::{BinaryCursor, BsonReader, BsonType, Error};

    fn cursor_of(doc: bson::Document) -> BinaryCursor {
        BinaryCursor::from_bytes(bson::to_vec(&doc).unwrap())
    }

    #[test]
    fn test_read_fields() {
        let mut cursor = cursor_of(doc! {
            "a": 1,
            "b": "x",
            "c": [true, 2.5_f64],
            "d": 7_i64,
        });
        let mut reader = BsonReader::new(&mut cursor);
        assert_eq!(reader.peek_current_type().unwrap(), BsonType::Document);
        reader.read_start_document().unwrap();

        assert_eq!(reader.peek_name().unwrap(), "a");
        assert_eq!(reader.read_int32().unwrap(), 1);
        assert_eq!(reader.current_name(), Some("a"));
        assert_eq!(reader.read_string().unwrap(), "x");

        reader.read_start_array().unwrap();
        assert!(reader.read_boolean().unwrap());
        assert_eq!(reader.read_double().unwrap(), 2.5);
        assert_eq!(reader.peek_current_type().unwrap(), BsonType::EndOfDocument);
        reader.read_end_array().unwrap();

        assert_eq!(reader.read_int64().unwrap(), 7);
        reader.read_end_document().unwrap();
        assert!(reader.is_top_level());
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_type_mismatch_does_not_consume() {
        let mut cursor = cursor_of(doc! { "a": "text" });
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        let before = reader.position();

        let err = reader.read_int32().unwrap_err();
        assert!(matches!(err, Error::TypeMismatch {
            expected: BsonType::Int32,
            actual: BsonType::String,
        }));
        assert_eq!(reader.position(), before);
        assert_eq!(reader.read_string().unwrap(), "text");
    }

    #[test]
    fn test_truncated_payload_rewinds() {
        let mut bytes = bson::to_vec(&doc! { "a": 1_i64 }).unwrap();
        // keep the header and a partial int64
        bytes.truncate(4 + 1 + 2 + 3);
        let mut cursor = BinaryCursor::from_bytes(bytes);
        let mut reader = BsonReader::new(&mut cursor);
        // the declared length runs past the end
        assert!(matches!(reader.read_start_document(), Err(Error::UnexpectedEnd { .. })));
        assert_eq!(reader.position(), 0);
        assert!(reader.is_top_level());
    }

    #[test]
    fn test_skip_value() {
        let mut cursor = cursor_of(doc! {
            "skip": { "nested": [1, 2, 3] },
            "keep": 42,
        });
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        reader.skip_value().unwrap();
        assert_eq!(reader.peek_name().unwrap(), "keep");
        assert_eq!(reader.read_int32().unwrap(), 42);
        reader.read_end_document().unwrap();
    }

    #[test]
    fn test_end_document_with_elements_left() {
        let mut cursor = cursor_of(doc! { "a": 1 });
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        let before = reader.position();
        assert!(matches!(reader.read_end_document(), Err(Error::InvalidLength(_))));
        assert_eq!(reader.position(), before);
        assert_eq!(reader.depth(), 1);
    }

    #[test]
    fn test_read_raw_document() {
        let inner = doc! { "x": 1 };
        let mut cursor = cursor_of(doc! { "inner": inner.clone() });
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        let raw = reader.read_raw_document().unwrap();
        assert_eq!(raw, bson::to_vec(&inner).unwrap());
        reader.read_end_document().unwrap();
    }

    #[test]
    fn test_element_outside_declared_container() {
        let mut bytes = bson::to_vec(&doc! { "a": { "k": bson::Bson::MinKey } }).unwrap();
        // the inner document now claims to be empty
        bytes[7..11].copy_from_slice(&5i32.to_le_bytes());
        let mut cursor = BinaryCursor::from_bytes(bytes);
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        reader.read_start_document().unwrap();
        let before = reader.position();

        assert!(matches!(reader.peek_current_type(), Err(Error::InvalidLength(5))));
        assert!(matches!(reader.read_min_key(), Err(Error::InvalidLength(5))));
        assert_eq!(reader.position(), before);
        assert_eq!(reader.depth(), 2);
    }

    #[test]
    fn test_value_running_past_container_rewinds() {
        let mut bytes = bson::to_vec(&doc! { "a": { "s": "hello" }, "b": 1 }).unwrap();
        // the string swallows the inner terminator
        bytes[14..18].copy_from_slice(&7i32.to_le_bytes());
        let mut cursor = BinaryCursor::from_bytes(bytes);
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        reader.read_start_document().unwrap();
        assert_eq!(reader.current_name(), Some("a"));
        let before = reader.position();

        assert!(matches!(reader.read_string(), Err(Error::InvalidLength(18))));
        assert_eq!(reader.position(), before);
        assert_eq!(reader.current_name(), Some("a"));
    }

    #[test]
    fn test_skip_value_checks_nested_length() {
        let mut bytes = bson::to_vec(&doc! { "a": { "x": 1 }, "b": 2 }).unwrap();
        assert_eq!(&bytes[7..11], &12i32.to_le_bytes());
        bytes[7..11].copy_from_slice(&14i32.to_le_bytes());
        let mut cursor = BinaryCursor::from_bytes(bytes);
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        let before = reader.position();

        assert!(matches!(reader.skip_value(), Err(Error::InvalidLength(14))));
        assert_eq!(reader.position(), before);
        assert_eq!(reader.depth(), 1);

        // a nested length reaching the outer terminator is refused as well
        let mut bytes = bson::to_vec(&doc! { "a": { "x": 1 } }).unwrap();
        bytes[7..11].copy_from_slice(&13i32.to_le_bytes());
        let mut cursor = BinaryCursor::from_bytes(bytes);
        let mut reader = BsonReader::new(&mut cursor);
        reader.read_start_document().unwrap();
        assert!(matches!(reader.skip_value(), Err(Error::InvalidLength(13))));
    }
}
