//! Raw request command
//!
//! Reads one JSON request from stdin and prints the JSON response, so
//! scripts and transports can drive every operation without the
//! subcommands.

use std::io::Read;

use anyhow::{Context, Result};

use folio_core::ApiFailure;

use super::FolioService;
use crate::output::Output;

/// Run one JSON request read from stdin
pub fn call(service: &FolioService, output: &Output) -> Result<()> {
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read request from stdin")?;

    run(service, &body, output)
}

fn run(service: &FolioService, body: &str, output: &Output) -> Result<()> {
    match service.handle_json(body) {
        Ok(value) => {
            output.json(&value);
            Ok(())
        }
        Err(failure) => {
            output.json(&failure);
            Err(failure.into())
        }
    }
}

/// True when `err` is a failure `call` already printed
pub fn is_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiFailure>().is_some()
}
