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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("bson error: {0}")]
    Bson(#[from] bsonwire_bson::Error),
    #[error("no document to remove")]
    NoDocumentToRemove,
    #[error("collection name '{0}' is illegal")]
    InvalidCollectionName(String),
    #[error("document size {size} exceeds the maximum {max}")]
    DocumentTooLarge {
        size: usize,
        max: usize,
    },
    #[error("message size {size} exceeds the maximum {max}")]
    MessageTooLarge {
        size: usize,
        max: usize,
    },
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("unexpected op code: {0}")]
    UnexpectedOpCode(i32),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
