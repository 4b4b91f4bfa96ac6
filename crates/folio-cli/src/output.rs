//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use folio_core::{
    AccountProfile, ApiFailure, DocumentAccess, DocumentEntry, DocumentSource, Privilege,
    ServiceError, Session,
};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print any serializable value as pretty JSON
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Failed to encode output: {}", e),
        }
    }

    /// Print the result of reading a document
    pub fn print_document(&self, access: &DocumentAccess) {
        match self.format {
            OutputFormat::Human => {
                let Some(doc) = &access.document else {
                    println!("No access to this document.");
                    return;
                };
                println!("ID:         {}", doc.id);
                println!("Title:      {}", doc.title);
                println!("Access:     {}", privilege_label(access.privilege));
                println!("Owner:      {}", doc.owner.username);
                if !doc.guests.is_empty() {
                    let names: Vec<&str> = doc.guests.iter().map(|g| g.username.as_str()).collect();
                    println!("Guests:     {}", names.join(", "));
                }
                println!("Updated:    {}", doc.last_updated.format("%Y-%m-%d %H:%M"));
                println!();
                if doc.content.is_empty() {
                    println!("(empty)");
                } else {
                    println!("{}", doc.content);
                }
            }
            OutputFormat::Json => self.json(access),
            OutputFormat::Quiet => {
                if let Some(doc) = &access.document {
                    print!("{}", doc.content);
                }
            }
        }
    }

    /// Print a document listing
    pub fn print_documents(&self, entries: &[DocumentEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No documents found.");
                    return;
                }
                for entry in entries {
                    let marker = match entry.source {
                        DocumentSource::Owned => " ",
                        DocumentSource::Guest => "*",
                    };
                    let preview = entry.summary.preview.as_deref().unwrap_or("");
                    println!(
                        "{} {} | {} | {} | {}",
                        marker,
                        short_id(&entry.summary.id.to_string()),
                        truncate(&entry.summary.title, 30),
                        entry.summary.last_updated.format("%Y-%m-%d %H:%M"),
                        truncate_line(preview, 40)
                    );
                }
                let shared = entries.iter().filter(|e| e.is_guest()).count();
                if shared > 0 {
                    println!("\n{} document(s), {} shared with you (*)", entries.len(), shared);
                } else {
                    println!("\n{} document(s)", entries.len());
                }
            }
            OutputFormat::Json => self.json(entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.summary.id);
                }
            }
        }
    }

    /// Print an account
    pub fn print_account(&self, account: &AccountProfile) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:         {}", account.id);
                println!("Username:   {}", account.username);
                println!("Documents:  {}", account.document_count);
                println!("Registered: {}", account.created_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => self.json(account),
            OutputFormat::Quiet => println!("{}", account.id),
        }
    }

    /// Print a table of accounts
    pub fn print_accounts(&self, accounts: &[AccountProfile]) {
        match self.format {
            OutputFormat::Human => {
                if accounts.is_empty() {
                    println!("No accounts found.");
                    return;
                }
                for account in accounts {
                    println!(
                        "{} | {:<16} | {:>4} doc(s) | {}",
                        short_id(&account.id.to_string()),
                        account.username,
                        account.document_count,
                        account.created_at.format("%Y-%m-%d")
                    );
                }
                println!("\n{} account(s)", accounts.len());
            }
            OutputFormat::Json => self.json(accounts),
            OutputFormat::Quiet => {
                for account in accounts {
                    println!("{}", account.username);
                }
            }
        }
    }

    /// Print a table of live sessions
    pub fn print_sessions(&self, sessions: &[Session]) {
        match self.format {
            OutputFormat::Human => {
                if sessions.is_empty() {
                    println!("No live sessions.");
                    return;
                }
                for session in sessions {
                    println!(
                        "{} | account {} | since {}",
                        short_id(&session.id),
                        session.account_id,
                        session.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\n{} session(s)", sessions.len());
            }
            OutputFormat::Json => self.json(sessions),
            OutputFormat::Quiet => {
                for session in sessions {
                    println!("{}", session.account_id);
                }
            }
        }
    }

    /// Print a failed operation on stderr (stdout in JSON mode)
    pub fn print_failure(&self, err: &ServiceError) {
        match self.format {
            OutputFormat::Json => self.json(&ApiFailure::from(err)),
            _ => {
                eprintln!("Error: {}", err.title());
                if let Some(description) = err.description() {
                    eprintln!("  {}", description);
                }
                if let ServiceError::Store(store_err) = err {
                    if let Some(hint) = store_err.recovery_suggestion() {
                        eprintln!("  Hint: {}", hint);
                    }
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Human label for a privilege level
pub fn privilege_label(privilege: Privilege) -> &'static str {
    match privilege {
        Privilege::None => "no access",
        Privilege::Guest => "guest",
        Privilege::Owner => "owner",
    }
}

/// First 8 characters of an id
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
