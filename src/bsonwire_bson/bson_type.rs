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

use std::fmt;
use std::convert::TryFrom;
use num_enum::TryFromPrimitive;
use crate::{Error, Result};

/// The tag byte preceding every element of a document.
///
/// Reference: https://bsonspec.org/spec.html
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum BsonType {
    EndOfDocument       = 0x00,
    Double              = 0x01,
    String              = 0x02,
    Document            = 0x03,
    Array               = 0x04,
    Binary              = 0x05,
    Undefined           = 0x06,
    ObjectId            = 0x07,
    Boolean             = 0x08,
    DateTime            = 0x09,
    Null                = 0x0A,
    RegularExpression   = 0x0B,
    DbPointer           = 0x0C,
    JavaScript          = 0x0D,
    Symbol              = 0x0E,
    JavaScriptWithScope = 0x0F,
    Int32               = 0x10,
    Timestamp           = 0x11,
    Int64               = 0x12,
    Decimal128          = 0x13,
    MaxKey              = 0x7F,
    MinKey              = 0xFF,
}

impl BsonType {

    pub fn from_tag(tag: u8) -> Result<BsonType> {
        BsonType::try_from(tag).map_err(|_| Error::UnknownBsonType(tag))
    }

    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

}

impl fmt::Display for BsonType {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

}
