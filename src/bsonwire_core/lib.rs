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


//! OP_INSERT message assembly on top of [bsonwire_bson].
//!
//! [wire::InsertMessage] builds one message in place and supports taking the
//! last document back out. [batch::InsertBatcher] uses that to split a
//! stream of documents into messages that respect the server limits.

pub mod batch;
pub mod config;
pub mod wire;
mod error;

pub use batch::{split_insert, InsertBatcher};
pub use config::{Config, InsertFlags};
pub use error::{Error, Result};
pub use wire::{InsertMessage, InsertMessageView, MessageState};
