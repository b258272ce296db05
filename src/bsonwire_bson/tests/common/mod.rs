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

use bson::{doc, Bson, Document};
use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bsonwire_bson::{BinaryCursor, BsonReader, BsonWriter};
use bsonwire_bson::serializers::{BsonSerializer, SerializerRegistry};

#[allow(dead_code)]
pub fn sample_document() -> Document {
    doc! {
        "_id": ObjectId::parse_str("5f1a2b3c4d5e6f7081920a1b").unwrap(),
        "name": "sensor-7",
        "active": true,
        "ratio": 0.25,
        "count": 12,
        "total": 9_000_000_000_i64,
        "low": Bson::MinKey,
        "high": Bson::MaxKey,
        "nothing": Bson::Null,
        "tags": ["a", "b", { "nested": [1, 2, 3] }],
        "blob": Bson::Binary(bson::Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![1, 2, 3, 4],
        }),
        "when": bson::DateTime::from_millis(1_600_000_000_000),
        "ts": bson::Timestamp { time: 100, increment: 7 },
    }
}

#[allow(dead_code)]
pub fn encode_with_registry<T: 'static>(value: &T) -> Vec<u8> {
    let serializer = SerializerRegistry::global().lookup::<T>().unwrap();
    let mut cursor = BinaryCursor::new();
    let mut writer = BsonWriter::new(&mut cursor);
    serializer.serialize(&mut writer, Some(value)).unwrap();
    cursor.into_inner()
}

#[allow(dead_code)]
pub fn decode_with_registry<T: 'static>(bytes: Vec<u8>) -> T {
    let serializer = SerializerRegistry::global().lookup::<T>().unwrap();
    let mut cursor = BinaryCursor::from_bytes(bytes);
    let mut reader = BsonReader::new(&mut cursor);
    serializer.deserialize(&mut reader).unwrap()
}
