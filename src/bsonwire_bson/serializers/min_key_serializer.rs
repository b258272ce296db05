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
use crate::{BsonReader, BsonType, BsonWriter, Error, MinKey, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct MinKeySerializer;

impl MinKeySerializer {

    pub fn new() -> MinKeySerializer {
        MinKeySerializer
    }

}

impl BsonSerializer<MinKey> for MinKeySerializer {

    fn serialize(&self, writer: &mut BsonWriter<'_>, value: Option<&MinKey>) -> Result<()> {
        if value.is_none() {
            return Err(Error::NullArgument("value"));
        }
        writer.write_min_key()
    }

    fn deserialize(&self, reader: &mut BsonReader<'_>) -> Result<MinKey> {
        let bson_type = reader.peek_current_type()?;
        match bson_type {
            BsonType::MinKey => {
                reader.read_min_key()?;
                Ok(MinKey)
            }
            _ => Err(Error::FormatMismatch {
                target: "MinKey",
                actual: bson_type,
            }),
        }
    }

}
