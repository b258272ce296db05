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

use crate::serializers::BsonSerializer;
use crate::{BsonReader, BsonType, BsonWriter, Error, MaxKey, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct MaxKeySerializer;

impl MaxKeySerializer {

    pub fn new() -> MaxKeySerializer {
        MaxKeySerializer
    }

}

impl BsonSerializer<MaxKey> for MaxKeySerializer {

    fn serialize(&self, writer: &mut BsonWriter<'_>, value: Option<&MaxKey>) -> Result<()> {
        if value.is_none() {
            return Err(Error::NullArgument("value"));
        }
        writer.write_max_key()
    }

    fn deserialize(&self, reader: &mut BsonReader<'_>) -> Result<MaxKey> {
        let bson_type = reader.peek_current_type()?;
        match bson_type {
            BsonType::MaxKey => {
                reader.read_max_key()?;
                Ok(MaxKey)
            }
            _ => Err(Error::FormatMismatch {
                target: "MaxKey",
                actual: bson_type,
            }),
        }
    }

}
