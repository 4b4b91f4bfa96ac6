//! Stored login
//!
//! `folio login` keeps the issued session in `session.toml` under the data
//! directory so later commands can authenticate. Writes go through a temp
//! file and a rename, so the file is never left half-written.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_core::LoginOutcome;

/// Credentials of the logged-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub account_id: Uuid,
    pub session_id: String,
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

impl From<&LoginOutcome> for StoredSession {
    fn from(login: &LoginOutcome) -> Self {
        Self {
            account_id: login.account_id,
            session_id: login.session_id.clone(),
            username: login.username.clone(),
            logged_in_at: Utc::now(),
        }
    }
}

/// Reads and writes the session file
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored session, if any
    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {:?}", self.path))?;
        let session = toml::from_str(&content)
            .with_context(|| format!("Failed to parse session file {:?}", self.path))?;
        Ok(Some(session))
    }

    /// Load the stored session or explain how to get one
    pub fn require(&self) -> Result<StoredSession> {
        self.load()?
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `folio login <username> <password>` first."))
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        let content = toml::to_string_pretty(session).context("Failed to serialize session")?;
        atomic_write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to save session to {:?}", self.path))
    }

    /// Remove the stored session; a missing file is fine
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", self.path)),
        }
    }
}

/// Write data to a file atomically
///
/// Writes to a temporary file first, then renames to the target path.
/// The file holds a bearer token, so on unix only the owner may read it.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = create_private(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(data)
        .with_context(|| format!("Failed to write to temp file {:?}", temp_path))?;

    // Sync to disk before rename
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}

#[cfg(unix)]
fn create_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // A stale temp file keeps its old mode
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
