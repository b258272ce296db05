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

//! BSON token writer/reader for the bsonwire message builder.
//!
//! A [BinaryCursor] owns the bytes. A [BsonWriter] or [BsonReader] walks the
//! cursor one token at a time, and a [serializers::BsonSerializer] resolved
//! from a [serializers::SerializerRegistry] turns a typed value into those
//! tokens and back.
//!
//! ```
//! use bsonwire_bson::{BinaryCursor, BsonWriter, BsonReader, MinKey};
//! use bsonwire_bson::serializers::{BsonSerializer, SerializerRegistry};
//!
//! let registry = SerializerRegistry::global();
//! let serializer = registry.lookup::<MinKey>().unwrap();
//!
//! let mut cursor = BinaryCursor::new();
//! let mut writer = BsonWriter::new(&mut cursor);
//! writer.write_start_document().unwrap();
//! writer.write_name("lower").unwrap();
//! serializer.serialize(&mut writer, Some(&MinKey)).unwrap();
//! writer.write_end_document().unwrap();
//!
//! cursor.seek(0).unwrap();
//! let mut reader = BsonReader::new(&mut cursor);
//! reader.read_start_document().unwrap();
//! assert_eq!(serializer.deserialize(&mut reader).unwrap(), MinKey);
//! ```

mod bson_type;
mod cursor;
mod error;
mod reader;
mod sentinel;
mod writer;
pub mod serializers;

pub use bson_type::BsonType;
pub use cursor::BinaryCursor;
pub use error::{Error, Result};
pub use reader::BsonReader;
pub use sentinel::{MaxKey, MinKey};
pub use writer::BsonWriter;

/// Checks the length prefix and terminator of an encoded document.
pub fn validate_document_bytes(bytes: &[u8]) -> Result<()> {
    writer::validate_raw_document(bytes)
}
