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

use bitflags::bitflags;
use crate::{Error, Result};

/// The largest message the server accepts.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 48 * 1024 * 1024;
/// The largest BSON object the server accepts.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;
pub const DEFAULT_MAX_BATCH_COUNT: usize = 1000;

bitflags! {

    /// The flags word of an OP_INSERT body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InsertFlags: u32 {
        const CONTINUE_ON_ERROR = 0b_0000_0000_0000_0000_0000_0000_0000_0001;
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub max_message_size:  usize,
    pub max_document_size: usize,
    pub max_batch_count:   usize,
    pub flags:             InsertFlags,
}

impl Config {

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_count == 0 {
            return Err(Error::InvalidConfig("max_batch_count should not be zero".into()));
        }
        if self.max_document_size == 0 {
            return Err(Error::InvalidConfig("max_document_size should not be zero".into()));
        }
        if self.max_message_size == 0 {
            return Err(Error::InvalidConfig("max_message_size should not be zero".into()));
        }
        if self.max_message_size > i32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "max_message_size should not exceed {}", i32::MAX,
            )));
        }
        Ok(())
    }

}

impl Default for Config {

    fn default() -> Self {
        Config {
            max_message_size:  DEFAULT_MAX_MESSAGE_SIZE,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_batch_count:   DEFAULT_MAX_BATCH_COUNT,
            flags:             InsertFlags::empty(),
        }
    }

}
