//! Account and session command handlers

use anyhow::Result;

use folio_core::ServiceError;

use super::FolioService;
use crate::output::{Output, OutputFormat};
use crate::session_file::{SessionFile, StoredSession};

/// Register a new account
pub fn register(
    service: &FolioService,
    username: String,
    password: String,
    output: &Output,
) -> Result<()> {
    let account = service.create_account(&username, &password)?;

    output.success(&format!("Registered account: {}", account.username));
    output.print_account(&account);
    Ok(())
}

/// Log in and remember the session
pub fn login(
    service: &FolioService,
    session_file: &SessionFile,
    username: String,
    password: String,
    output: &Output,
) -> Result<()> {
    let outcome = service.login(&username, &password)?;
    session_file.save(&StoredSession::from(&outcome))?;

    match output.format {
        OutputFormat::Json => output.json(&outcome),
        OutputFormat::Quiet => {}
        OutputFormat::Human => {
            output.success(&format!(
                "Logged in as {} ({} document(s))",
                outcome.username, outcome.document_count
            ));
        }
    }
    Ok(())
}

/// End the stored session
///
/// The local session file is removed even if the server side session was
/// already gone.
pub fn logout(service: &FolioService, session_file: &SessionFile, output: &Output) -> Result<()> {
    let stored = session_file.require()?;

    let result = service.logout(stored.account_id);
    session_file.clear()?;

    match result {
        Ok(outcome) => {
            if output.is_json() {
                output.json(&outcome);
            } else {
                output.success(&format!("Logged out {}", stored.username));
            }
            Ok(())
        }
        Err(ServiceError::NotSignedIn) => {
            output.message("Session had already ended.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Show the account behind the stored session
pub fn whoami(service: &FolioService, session_file: &SessionFile, output: &Output) -> Result<()> {
    let stored = session_file.require()?;
    let account = service.validate_session(&stored.session_id, stored.account_id)?;
    output.print_account(&account);
    Ok(())
}
