//! Command handlers

pub mod account;
pub mod admin;
pub mod call;
pub mod config;
pub mod document;

use std::io::{self, Write};

use anyhow::Result;
use folio_core::{Argon2Hasher, Service, SqliteStore};

/// The service as the CLI runs it
pub type FolioService = Service<SqliteStore, Argon2Hasher>;

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
