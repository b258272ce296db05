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
use bson::{Decimal128, Timestamp};
use smallvec::{SmallVec, smallvec};
use crate::{BinaryCursor, BsonType, Error, Result};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum ContainerKind {
    Document,
    Array,
}

struct WriterContext {
    kind: ContainerKind,
    // offset of the length field of this container
    start: usize,
    next_index: u32,
}

/// Emits the BSON token stream onto a [BinaryCursor].
///
/// Inside a document every value must be preceded by [BsonWriter::write_name],
/// inside an array the element names are generated. At top level only
/// documents can be written, without a tag.
pub struct BsonWriter<'a> {
    cursor: &'a mut BinaryCursor,
    stack: SmallVec<[WriterContext; 8]>,
    name: Option<String>,
}

impl<'a> BsonWriter<'a> {

    pub fn new(cursor: &'a mut BinaryCursor) -> BsonWriter<'a> {
        BsonWriter {
            cursor,
            stack: smallvec![],
            name: None,
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.stack.is_empty()
    }

    /// Bytes written to the underlying cursor so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    pub fn write_name(&mut self, name: &str) -> Result<()> {
        match self.stack.last() {
            Some(ctx) if ctx.kind == ContainerKind::Document => (),
            Some(_) => return Err(Error::InvalidWriterState("array elements can not be named".into())),
            None => return Err(Error::InvalidWriterState("a name can not be written at top level".into())),
        }
        if self.name.is_some() {
            return Err(Error::InvalidWriterState("a name is already pending".into()));
        }
        if name.as_bytes().contains(&0) {
            return Err(Error::InvalidCString);
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    pub fn write_start_document(&mut self) -> Result<()> {
        if !self.is_top_level() {
            self.write_element_header(BsonType::Document)?;
        }
        self.push_container(ContainerKind::Document)
    }

    pub fn write_end_document(&mut self) -> Result<()> {
        self.pop_container(ContainerKind::Document)
    }

    pub fn write_start_array(&mut self) -> Result<()> {
        self.write_element_header(BsonType::Array)?;
        self.push_container(ContainerKind::Array)
    }

    pub fn write_end_array(&mut self) -> Result<()> {
        self.pop_container(ContainerKind::Array)
    }

    /// Copies an already encoded document.
    pub fn write_raw_document(&mut self, bytes: &[u8]) -> Result<()> {
        validate_raw_document(bytes)?;
        if !self.is_top_level() {
            self.write_element_header(BsonType::Document)?;
        }
        self.cursor.write_bytes(bytes);
        Ok(())
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.write_element_header(BsonType::Double)?;
        self.cursor.write_f64(value)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_element_header(BsonType::String)?;
        self.cursor.write_string(value)
    }

    pub fn write_binary(&mut self, subtype: BinarySubtype, bytes: &[u8]) -> Result<()> {
        self.write_element_header(BsonType::Binary)?;
        if subtype == BinarySubtype::BinaryOld {
            // the old subtype repeats the length inside the payload
            self.cursor.write_i32((bytes.len() + 4) as i32)?;
            self.cursor.write_u8(u8::from(subtype))?;
            self.cursor.write_i32(bytes.len() as i32)?;
        } else {
            self.cursor.write_i32(bytes.len() as i32)?;
            self.cursor.write_u8(u8::from(subtype))?;
        }
        self.cursor.write_bytes(bytes);
        Ok(())
    }

    pub fn write_undefined(&mut self) -> Result<()> {
        self.write_element_header(BsonType::Undefined)
    }

    pub fn write_object_id(&mut self, oid: &ObjectId) -> Result<()> {
        self.write_element_header(BsonType::ObjectId)?;
        self.cursor.write_bytes(&oid.bytes());
        Ok(())
    }

    pub fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.write_element_header(BsonType::Boolean)?;
        self.cursor.write_u8(value as u8)
    }

    /// Milliseconds since the Unix epoch.
    pub fn write_date_time(&mut self, millis: i64) -> Result<()> {
        self.write_element_header(BsonType::DateTime)?;
        self.cursor.write_i64(millis)
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.write_element_header(BsonType::Null)
    }

    pub fn write_regular_expression(&mut self, pattern: &str, options: &str) -> Result<()> {
        if pattern.as_bytes().contains(&0) || options.as_bytes().contains(&0) {
            return Err(Error::InvalidCString);
        }
        self.write_element_header(BsonType::RegularExpression)?;
        self.cursor.write_cstring(pattern)?;
        self.cursor.write_cstring(options)
    }

    pub fn write_javascript(&mut self, code: &str) -> Result<()> {
        self.write_element_header(BsonType::JavaScript)?;
        self.cursor.write_string(code)
    }

    pub fn write_symbol(&mut self, symbol: &str) -> Result<()> {
        self.write_element_header(BsonType::Symbol)?;
        self.cursor.write_string(symbol)
    }

    pub fn write_int32(&mut self, value: i32) -> Result<()> {
        self.write_element_header(BsonType::Int32)?;
        self.cursor.write_i32(value)
    }

    pub fn write_timestamp(&mut self, ts: Timestamp) -> Result<()> {
        self.write_element_header(BsonType::Timestamp)?;
        self.cursor.write_u32(ts.increment)?;
        self.cursor.write_u32(ts.time)
    }

    pub fn write_int64(&mut self, value: i64) -> Result<()> {
        self.write_element_header(BsonType::Int64)?;
        self.cursor.write_i64(value)
    }

    pub fn write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        self.write_element_header(BsonType::Decimal128)?;
        self.cursor.write_bytes(&value.bytes());
        Ok(())
    }

    pub fn write_min_key(&mut self) -> Result<()> {
        self.write_element_header(BsonType::MinKey)
    }

    pub fn write_max_key(&mut self) -> Result<()> {
        self.write_element_header(BsonType::MaxKey)
    }

    fn write_element_header(&mut self, ty: BsonType) -> Result<()> {
        let ctx = match self.stack.last_mut() {
            Some(ctx) => ctx,
            None => {
                return Err(Error::InvalidWriterState(
                    format!("{} can not be written at top level, only documents can", ty),
                ));
            }
        };
        match ctx.kind {
            ContainerKind::Document => {
                let name = self.name.take().ok_or_else(|| {
                    Error::InvalidWriterState(format!("a name must be written before {}", ty))
                })?;
                self.cursor.write_u8(ty.tag())?;
                self.cursor.write_cstring(&name)?;
            }
            ContainerKind::Array => {
                let index = ctx.next_index;
                ctx.next_index += 1;
                self.cursor.write_u8(ty.tag())?;
                self.cursor.write_cstring(&index.to_string())?;
            }
        }
        Ok(())
    }

    fn push_container(&mut self, kind: ContainerKind) -> Result<()> {
        let start = self.cursor.position();
        // backpatched in pop_container
        self.cursor.write_i32(0)?;
        self.stack.push(WriterContext {
            kind,
            start,
            next_index: 0,
        });
        Ok(())
    }

    fn pop_container(&mut self, kind: ContainerKind) -> Result<()> {
        match self.stack.last() {
            Some(ctx) if ctx.kind == kind => (),
            _ => return Err(Error::InvalidWriterState(format!("no open {:?} to end", kind))),
        }
        if self.name.is_some() {
            return Err(Error::InvalidWriterState("a name is pending without a value".into()));
        }
        self.cursor.write_u8(0)?;
        if let Some(ctx) = self.stack.pop() {
            let len = self.cursor.position() - ctx.start;
            self.cursor.patch_i32(ctx.start, len as i32)?;
        }
        Ok(())
    }

}

pub(crate) fn validate_raw_document(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 5 {
        return Err(Error::InvalidLength(bytes.len() as i32));
    }
    let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if declared as usize != bytes.len() || bytes[bytes.len() - 1] != 0 {
        return Err(Error::InvalidLength(declared));
    }
    Ok(())
}
