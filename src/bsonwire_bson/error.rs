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

use std::io;
use std::str::Utf8Error;
use std::string::FromUtf8Error;
use thiserror::Error;
use crate::bson_type::BsonType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("position {position} is out of range, length: {length}")]
    OutOfRange {
        position: usize,
        length: usize,
    },
    #[error("unexpected end of data, {needed} bytes needed, {remaining} remaining")]
    UnexpectedEnd {
        needed: usize,
        remaining: usize,
    },
    #[error("type mismatch, expected: {expected:?}, actual: {actual:?}")]
    TypeMismatch {
        expected: BsonType,
        actual: BsonType,
    },
    #[error("cannot deserialize {target} from BsonType {actual:?}")]
    FormatMismatch {
        target: &'static str,
        actual: BsonType,
    },
    #[error("argument '{0}' must not be null")]
    NullArgument(&'static str),
    #[error("unknown bson type: 0x{0:02X}")]
    UnknownBsonType(u8),
    #[error("invalid writer state: {0}")]
    InvalidWriterState(String),
    #[error("invalid reader state: {0}")]
    InvalidReaderState(String),
    #[error("cstring must not contain a zero byte")]
    InvalidCString,
    #[error("invalid length: {0}")]
    InvalidLength(i32),
    #[error("bson type {0:?} is not supported")]
    UnsupportedType(BsonType),
    #[error("no serializer registered for type '{0}'")]
    SerializerNotFound(&'static str),
    #[error("a serializer for type '{0}' is already registered")]
    SerializerAlreadyRegistered(&'static str),
    #[error("the lock of the serializer registry is poisoned")]
    LockError,
    #[error("utf8 error: {source}")]
    UTF8Err {
        #[from]
        source: Utf8Error,
    },
    #[error("{0}")]
    FromUtf8Error(Box<FromUtf8Error>),
    #[error("io error: {0}")]
    IOErr(#[from] io::Error),
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::FromUtf8Error(Box::new(value))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
