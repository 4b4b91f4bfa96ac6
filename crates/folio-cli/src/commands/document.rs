//! Document command handlers

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use folio_core::{Include, Privilege};

use super::{confirm, FolioService};
use crate::output::{short_id, Output, OutputFormat};
use crate::session_file::StoredSession;

/// Create an empty document
pub fn create(
    service: &FolioService,
    session: &StoredSession,
    title: String,
    output: &Output,
) -> Result<()> {
    let created = service.create_document(&session.session_id, session.account_id, &title)?;

    match output.format {
        OutputFormat::Json => output.json(&created),
        OutputFormat::Quiet => println!("{}", created.document_id),
        OutputFormat::Human => output.success(&format!("Created document: {}", created.document_id)),
    }
    Ok(())
}

/// List documents; with neither flag, both owned and shared are listed
pub fn list(
    service: &FolioService,
    session: &StoredSession,
    mine: bool,
    guest: bool,
    output: &Output,
) -> Result<()> {
    let include = if !mine && !guest {
        Include::all()
    } else {
        Include { mine, guest }
    };

    let entries = service.get_documents(&session.session_id, session.account_id, include)?;
    output.print_documents(&entries);
    Ok(())
}

/// Show one document
pub fn show(
    service: &FolioService,
    session: &StoredSession,
    id: String,
    output: &Output,
) -> Result<()> {
    let document_id = parse_document_id(service, session, &id)?;
    let access = service.get_document(&session.session_id, session.account_id, document_id)?;

    output.print_document(&access);
    if access.privilege == Privilege::None && !output.is_json() {
        bail!("No access to document: {}", id);
    }
    Ok(())
}

/// Replace a document's content
///
/// Content comes from `--content`, else `--file`, else stdin.
pub fn write(
    service: &FolioService,
    session: &StoredSession,
    id: String,
    content: Option<String>,
    file: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let document_id = parse_document_id(service, session, &id)?;
    let content = read_content(content, file)?;

    service.write_doc_content(
        &session.session_id,
        session.account_id,
        document_id,
        &content,
    )?;

    output.success(&format!(
        "Wrote {} character(s) to {}",
        content.chars().count(),
        short_id(&document_id.to_string())
    ));
    Ok(())
}

/// Rename a document
pub fn rename(
    service: &FolioService,
    session: &StoredSession,
    id: String,
    title: String,
    output: &Output,
) -> Result<()> {
    let document_id = parse_document_id(service, session, &id)?;
    let renamed =
        service.rename_document(&session.session_id, session.account_id, document_id, &title)?;

    match output.format {
        OutputFormat::Json => output.json(&renamed),
        _ => output.success(&format!("Renamed to: {}", renamed.title)),
    }
    Ok(())
}

/// Delete a document
pub fn delete(
    service: &FolioService,
    session: &StoredSession,
    id: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let document_id = parse_document_id(service, session, &id)?;

    // Confirm deletion
    if output.should_prompt() && !yes {
        println!("Delete document: {}", short_id(&document_id.to_string()));
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = service.delete_document(&session.session_id, session.account_id, document_id)?;

    match output.format {
        OutputFormat::Json => output.json(&deleted),
        _ => output.success(&format!("Deleted document: {}", deleted.title)),
    }
    Ok(())
}

/// Give another account read access
pub fn share(
    service: &FolioService,
    session: &StoredSession,
    id: String,
    username: String,
    output: &Output,
) -> Result<()> {
    let document_id = parse_document_id(service, session, &id)?;
    let guest = service.share_document(
        &session.session_id,
        session.account_id,
        document_id,
        &username,
    )?;

    match output.format {
        OutputFormat::Json => output.json(&guest),
        _ => output.success(&format!("Shared with {}", guest.username)),
    }
    Ok(())
}

/// Revoke another account's read access
pub fn unshare(
    service: &FolioService,
    session: &StoredSession,
    id: String,
    username: String,
    output: &Output,
) -> Result<()> {
    let document_id = parse_document_id(service, session, &id)?;
    let guest = service.remove_share_access(
        &session.session_id,
        session.account_id,
        document_id,
        &username,
    )?;

    match output.format {
        OutputFormat::Json => output.json(&guest),
        _ => output.success(&format!("Removed access for {}", guest.username)),
    }
    Ok(())
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(content) = content {
        return Ok(content);
    }

    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read content from {:?}", path));
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read content from stdin")?;
    Ok(buf)
}

/// Parse a document ID (full UUID or prefix of a visible document)
fn parse_document_id(service: &FolioService, session: &StoredSession, id: &str) -> Result<Uuid> {
    // Try full UUID first
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    // Try prefix match
    let entries = service.get_documents(&session.session_id, session.account_id, Include::all())?;
    let matches: Vec<_> = entries
        .iter()
        .filter(|e| e.summary.id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No document found matching: {}", id),
        1 => Ok(matches[0].summary.id),
        _ => {
            eprintln!("Multiple documents match '{}':", id);
            for entry in &matches {
                eprintln!("  {} - {}", entry.summary.id, entry.summary.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
