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

mod min_key_serializer;
mod max_key_serializer;
mod primitive_serializers;
mod bson_value_serializer;
mod document_serializer;
mod registry;

use crate::{BsonReader, BsonType, BsonWriter, Error, Result};

pub use min_key_serializer::MinKeySerializer;
pub use max_key_serializer::MaxKeySerializer;
pub use primitive_serializers::{
    BooleanSerializer,
    DoubleSerializer,
    Int32Serializer,
    Int64Serializer,
    ObjectIdSerializer,
    StringSerializer,
};
pub use bson_value_serializer::BsonValueSerializer;
pub use document_serializer::{DocumentSerializer, RawDocumentSerializer};
pub use registry::SerializerRegistry;

/// Encodes and decodes values of one declared type.
///
/// Implementations hold no state, one instance is shared by every caller.
pub trait BsonSerializer<T>: Send + Sync {

    /// `None` stands for an absent value.
    fn serialize(&self, writer: &mut BsonWriter<'_>, value: Option<&T>) -> Result<()>;

    fn deserialize(&self, reader: &mut BsonReader<'_>) -> Result<T>;

}

/// Fails with [Error::FormatMismatch] unless the next value has type `expected`.
pub(crate) fn expect_current_type(
    reader: &BsonReader<'_>,
    expected: BsonType,
    target: &'static str,
) -> Result<()> {
    let actual = reader.peek_current_type()?;
    if actual != expected {
        return Err(Error::FormatMismatch {
            target,
            actual,
        });
    }
    Ok(())
}
