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

//! Command line front end for the bsonwire crates.
//!
//! `bsonwire split --collection db.coll docs.json` encodes the documents into
//! as many OP_INSERT messages as the limits require, one hex line each.
//!
//! `bsonwire inspect messages.hex` decodes those lines back and prints the
//! header fields and documents.

mod commands;
mod hex;

use std::fs;
use std::process;
use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command as App};
use log::error;
use bsonwire_core::{Config, InsertFlags};

fn main() {
    env_logger::init();
    let app = App::new("bsonwire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build and inspect OP_INSERT messages")
        .author("Vincent Chan <okcdz@diverse.space>")
        .subcommand_required(true)
        .subcommand(App::new("split")
            .about("encode the documents of a JSON file into insert messages")
            .arg(
                Arg::new("collection")
                    .short('c')
                    .long("collection")
                    .help("full collection name, like db.coll")
                    .required(true)
                    .num_args(1)
            )
            .arg(
                Arg::new("max-message-size")
                    .long("max-message-size")
                    .help("the maximum size of a message in bytes")
                    .num_args(1)
            )
            .arg(
                Arg::new("max-batch-count")
                    .long("max-batch-count")
                    .help("the maximum number of documents in a message")
                    .num_args(1)
            )
            .arg(
                Arg::new("continue-on-error")
                    .long("continue-on-error")
                    .help("set the ContinueOnError flag")
                    .action(ArgAction::SetTrue)
            )
            .arg(
                Arg::new("file")
                    .value_name("JSON_FILE")
                    .required(true)
            )
        )
        .subcommand(App::new("inspect")
            .about("decode hex encoded insert messages, one per line")
            .arg(
                Arg::new("file")
                    .value_name("HEX_FILE")
                    .required(true)
            )
        );

    let matches = app.get_matches();

    let result = match matches.subcommand() {
        Some(("split", sub)) => run_split(sub),
        Some(("inspect", sub)) => run_inspect(sub),
        _ => Err(anyhow!("unknown command")),
    };

    if let Err(err) = result {
        error!("{:?}", err);
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run_split(sub: &ArgMatches) -> Result<()> {
    let collection = required_arg(sub, "collection")?;
    let path = required_arg(sub, "file")?;

    let mut config = Config::default();
    if let Some(size) = sub.get_one::<String>("max-message-size") {
        config.max_message_size = size.parse()?;
    }
    if let Some(count) = sub.get_one::<String>("max-batch-count") {
        config.max_batch_count = count.parse()?;
    }
    if sub.get_flag("continue-on-error") {
        config.flags |= InsertFlags::CONTINUE_ON_ERROR;
    }

    let json = fs::read_to_string(path)?;
    for line in commands::split(&json, collection, config)? {
        println!("{}", line);
    }
    Ok(())
}

fn run_inspect(sub: &ArgMatches) -> Result<()> {
    let path = required_arg(sub, "file")?;
    let text = fs::read_to_string(path)?;
    print!("{}", commands::inspect(&text)?);
    Ok(())
}

fn required_arg<'a>(sub: &'a ArgMatches, name: &str) -> Result<&'a String> {
    sub.get_one::<String>(name)
        .ok_or_else(|| anyhow!("missing argument: {}", name))
}
