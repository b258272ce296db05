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

use bson::{doc, Document};
use bsonwire_core::InsertMessageView;

/// Header, flags and the cstring name.
#[allow(dead_code)]
pub fn prefix_len(collection_full_name: &str) -> usize {
    16 + 4 + collection_full_name.len() + 1
}

#[allow(dead_code)]
pub fn header_length(bytes: &[u8]) -> usize {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
}

#[allow(dead_code)]
pub fn make_items(size: usize) -> Vec<Document> {
    let mut data: Vec<Document> = vec![];

    for i in 0..size {
        let content = i.to_string();
        data.push(doc! {
            "_id": i as i64,
            "content": content,
        });
    }

    data
}

#[allow(dead_code)]
pub fn decode_all(batches: &[Vec<u8>]) -> Vec<Document> {
    let mut result = vec![];
    for batch in batches {
        let view = InsertMessageView::parse(batch).unwrap();
        assert_eq!(view.header.length as usize, batch.len());
        result.extend(view.documents().unwrap());
    }
    result
}
