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

use std::convert::TryFrom;
use std::fmt::Write;
use anyhow::{anyhow, Result};
use bson::{Bson, Document};
use log::{debug, info};
use bsonwire_core::{split_insert, Config, InsertMessageView};
use crate::hex;

/// Accepts a JSON array of objects or a single object, in extended JSON.
pub(crate) fn parse_documents(json: &str) -> Result<Vec<Document>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        object @ serde_json::Value::Object(_) => vec![object],
        _ => return Err(anyhow!("expected a JSON object or an array of objects")),
    };

    let mut documents = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match Bson::try_from(item)? {
            Bson::Document(doc) => documents.push(doc),
            other => {
                return Err(anyhow!("item {} is not a document: {}", index, other));
            }
        }
    }
    Ok(documents)
}

/// One hex encoded message per line.
pub(crate) fn split(json: &str, collection: &str, config: Config) -> Result<Vec<String>> {
    let documents = parse_documents(json)?;
    debug!("parsed {} documents", documents.len());

    let batches = split_insert(collection, &documents, config)?;
    info!("{} documents split into {} messages", documents.len(), batches.len());

    Ok(batches.iter().map(|batch| hex::encode(batch)).collect())
}

pub(crate) fn inspect(hex_text: &str) -> Result<String> {
    let mut out = String::new();
    let lines = hex_text.lines().map(str::trim).filter(|line| !line.is_empty());

    for (index, line) in lines.enumerate() {
        let bytes = hex::decode(line)?;
        let view = InsertMessageView::parse(&bytes)
            .map_err(|err| anyhow!("message {}: {}", index, err))?;

        writeln!(
            out,
            "message {}: length={} request_id={} response_to={} op_code={:?} flags={:?} collection={} documents={}",
            index,
            view.header.length,
            view.header.request_id,
            view.header.response_to,
            view.header.op_code,
            view.flags,
            view.collection_full_name,
            view.raw_documents.len(),
        )?;
        for doc in view.documents()? {
            writeln!(out, "  {}", Bson::Document(doc).into_relaxed_extjson())?;
        }
    }

    Ok(out)
}
