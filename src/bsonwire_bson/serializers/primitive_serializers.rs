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
use crate::serializers::{expect_current_type, BsonSerializer};
use crate::{BsonReader, BsonType, BsonWriter, Result};

// An absent value is written as BSON null, the payload is read back strictly.
macro_rules! primitive_serializer {
    (
        $name:ident, $ty:ty, $bson_type:expr,
        |$writer:ident, $value:ident| $write:expr,
        |$reader:ident| $read:expr $(,)?
    ) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl BsonSerializer<$ty> for $name {

            fn serialize(&self, $writer: &mut BsonWriter<'_>, value: Option<&$ty>) -> Result<()> {
                match value {
                    Some($value) => $write,
                    None => $writer.write_null(),
                }
            }

            fn deserialize(&self, $reader: &mut BsonReader<'_>) -> Result<$ty> {
                expect_current_type($reader, $bson_type, stringify!($ty))?;
                $read
            }

        }
    };
}

primitive_serializer!(
    DoubleSerializer, f64, BsonType::Double,
    |writer, value| writer.write_double(*value),
    |reader| reader.read_double(),
);

primitive_serializer!(
    Int32Serializer, i32, BsonType::Int32,
    |writer, value| writer.write_int32(*value),
    |reader| reader.read_int32(),
);

primitive_serializer!(
    Int64Serializer, i64, BsonType::Int64,
    |writer, value| writer.write_int64(*value),
    |reader| reader.read_int64(),
);

primitive_serializer!(
    BooleanSerializer, bool, BsonType::Boolean,
    |writer, value| writer.write_boolean(*value),
    |reader| reader.read_boolean(),
);

primitive_serializer!(
    StringSerializer, String, BsonType::String,
    |writer, value| writer.write_string(value),
    |reader| reader.read_string(),
);

primitive_serializer!(
    ObjectIdSerializer, ObjectId, BsonType::ObjectId,
    |writer, value| writer.write_object_id(value),
    |reader| reader.read_object_id(),
);
