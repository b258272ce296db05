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

use std::sync::Arc;
use log::{debug, warn};
use bsonwire_bson::serializers::SerializerRegistry;
use crate::config::Config;
use crate::wire::InsertMessage;
use crate::{Error, Result};

/// Splits a stream of documents into insert messages that fit the limits
/// in [Config].
///
/// Each document is appended to the open message. When that pushes the
/// message over a limit, the document is taken back off, the message is
/// emitted, and a new message is started from the same document.
pub struct InsertBatcher {
    config:  Config,
    message: InsertMessage,
    batches: Vec<Vec<u8>>,
}

impl InsertBatcher {

    pub fn new(collection_full_name: &str, config: Config) -> Result<InsertBatcher> {
        InsertBatcher::with_registry(collection_full_name, config, SerializerRegistry::global())
    }

    pub fn with_registry(
        collection_full_name: &str,
        config: Config,
        registry: Arc<SerializerRegistry>,
    ) -> Result<InsertBatcher> {
        config.validate()?;
        let message = InsertMessage::new(collection_full_name)?
            .with_flags(config.flags)
            .with_registry(registry);
        Ok(InsertBatcher {
            config,
            message,
            batches: Vec::new(),
        })
    }

    /// Messages completed so far.
    #[inline]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Documents in the open message.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.message.document_count()
    }

    pub fn push<T: 'static>(&mut self, document: &T) -> Result<()> {
        self.message.add_document(document)?;

        let size = self.message.last_document_len().unwrap_or(0);
        if size > self.config.max_document_size {
            warn!(
                "document of {} bytes exceeds the maximum {}",
                size, self.config.max_document_size,
            );
            self.message.remove_last_document()?;
            return Err(Error::DocumentTooLarge {
                size,
                max: self.config.max_document_size,
            });
        }

        if !self.over_limit() {
            return Ok(());
        }

        if self.message.document_count() == 1 {
            let size = self.message.len();
            warn!("a single document makes a message of {} bytes", size);
            self.message.remove_last_document()?;
            return Err(Error::MessageTooLarge {
                size,
                max: self.config.max_message_size,
            });
        }

        let document = self.message.remove_last_document()?;
        let batch = self.message.finalize()?;
        debug!(
            "emitting batch {} for '{}': {} documents, {} bytes",
            self.batches.len(),
            self.message.collection_full_name(),
            self.message.document_count(),
            batch.len(),
        );
        self.batches.push(batch);
        self.message.reset(&document)?;

        if self.over_limit() {
            let size = self.message.len();
            warn!("a single document makes a message of {} bytes", size);
            self.message.remove_last_document()?;
            return Err(Error::MessageTooLarge {
                size,
                max: self.config.max_message_size,
            });
        }
        Ok(())
    }

    /// Emits the open message, if it holds any document.
    pub fn finish(self) -> Result<Vec<Vec<u8>>> {
        let InsertBatcher { message, mut batches, .. } = self;
        if message.document_count() > 0 {
            batches.push(message.into_bytes()?);
        }
        Ok(batches)
    }

    fn over_limit(&self) -> bool {
        self.message.len() > self.config.max_message_size
            || self.message.document_count() > self.config.max_batch_count
    }

}

/// Encodes `documents` into as many insert messages as the limits require.
pub fn split_insert<T: 'static>(
    collection_full_name: &str,
    documents: &[T],
    config: Config,
) -> Result<Vec<Vec<u8>>> {
    let mut batcher = InsertBatcher::new(collection_full_name, config)?;
    for document in documents {
        batcher.push(document)?;
    }
    batcher.finish()
}
