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
use num_enum::TryFromPrimitive;
use bsonwire_bson::BinaryCursor;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(i32)]
pub enum OpCode {
    Reply       = 1,
    Update      = 2001,
    Insert      = 2002,
    Query       = 2004,
    GetMore     = 2005,
    Delete      = 2006,
    KillCursors = 2007,
    Compressed  = 2012,
    Message     = 2013,
}

impl OpCode {

    pub fn from_i32(value: i32) -> Result<OpCode> {
        OpCode::try_from(value).map_err(|_| Error::UnexpectedOpCode(value))
    }

}

/// The header shared by every wire protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub length: i32,
    pub request_id: i32,
    pub response_to: i32,
    pub op_code: OpCode,
}

impl Header {
    pub const LENGTH: usize = 4 * std::mem::size_of::<i32>();

    /// Writes the header at the cursor's current position.
    pub fn write_to(&self, cursor: &mut BinaryCursor) -> Result<()> {
        cursor.write_i32(self.length)?;
        cursor.write_i32(self.request_id)?;
        cursor.write_i32(self.response_to)?;
        cursor.write_i32(self.op_code as i32)?;
        Ok(())
    }

    pub fn read_from(cursor: &mut BinaryCursor) -> Result<Header> {
        let start = cursor.position();
        let result = Header::read_fields(cursor);
        if result.is_err() {
            cursor.seek(start)?;
        }
        result
    }

    fn read_fields(cursor: &mut BinaryCursor) -> Result<Header> {
        let length = cursor.read_i32()?;
        let request_id = cursor.read_i32()?;
        let response_to = cursor.read_i32()?;
        let op_code = OpCode::from_i32(cursor.read_i32()?)?;

        Ok(Header {
            length,
            request_id,
            response_to,
            op_code,
        })
    }

}

#[cfg(test)]
mod tests {
    use bsonwire_bson::BinaryCursor;
    use crate::wire::{Header, OpCode};
    use crate::Error;

    #[test]
    fn test_header_layout() {
        let header = Header {
            length: 33,
            request_id: 7,
            response_to: 0,
            op_code: OpCode::Insert,
        };
        let mut cursor = BinaryCursor::new();
        header.write_to(&mut cursor).unwrap();

        assert_eq!(cursor.len(), Header::LENGTH);
        assert_eq!(cursor.as_bytes(), &[
            33, 0, 0, 0,
            7, 0, 0, 0,
            0, 0, 0, 0,
            0xD2, 0x07, 0, 0,
        ]);

        cursor.seek(0).unwrap();
        assert_eq!(Header::read_from(&mut cursor).unwrap(), header);
    }

    #[test]
    fn test_unknown_op_code() {
        let mut bytes = vec![16, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&2003i32.to_le_bytes());
        let mut cursor = BinaryCursor::from_bytes(bytes);

        let err = Header::read_from(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::UnexpectedOpCode(2003)));
        assert_eq!(cursor.position(), 0);
    }
}
