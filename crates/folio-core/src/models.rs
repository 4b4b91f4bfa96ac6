//! Data models for folio
//!
//! Stored records (`Account`, `Session`, `Document`), the derived
//! `Privilege`, and the trimmed projections handed back to callers.
//! Outward-facing types serialize with camelCase keys.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account
///
/// Holds the password hash, so it is never serialized outward as-is;
/// use [`AccountProfile`] for responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique identifier
    pub id: Uuid,
    /// Unique username
    pub username: String,
    /// Opaque hash produced by the password hasher
    pub password_hash: String,
    /// Denormalized count of owned documents
    pub document_count: i64,
    /// When this account was registered
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account record with no documents
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            document_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Outward projection without the password hash
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            username: self.username.clone(),
            document_count: self.document_count,
            created_at: self.created_at,
        }
    }
}

/// Account as it may be shown to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub username: String,
    pub document_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Minimal reference to an account (owner or guest)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRef {
    pub id: Uuid,
    pub username: String,
}

/// A live login, bound to exactly one account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque random token
    pub id: String,
    /// The account this session authenticates
    pub account_id: Uuid,
    /// When the session was issued
    pub created_at: DateTime<Utc>,
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    /// Owner; immutable after creation
    pub owner_id: Uuid,
    /// Normalized title, unique among the owner's documents
    pub title: String,
    pub content: String,
    /// First 127 characters of content, `None` while content is empty
    pub preview: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Document {
    /// Create an empty document for `owner_id`
    pub fn new(owner_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            content: String::new(),
            preview: None,
            created_at: now,
            last_updated: now,
        }
    }

    /// Listing projection
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            title: self.title.clone(),
            last_updated: self.last_updated,
            created_at: self.created_at,
            preview: self.preview.clone(),
        }
    }
}

/// Access level of an account on a document
///
/// Derived per request and never stored. An owner is never also a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Privilege {
    None = 0,
    Guest = 1,
    Owner = 2,
}

impl Privilege {
    /// Numeric level as exposed to clients
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Whether this level may read the document
    pub fn can_read(self) -> bool {
        self > Privilege::None
    }

    /// Whether this level owns the document
    pub fn is_owner(self) -> bool {
        self == Privilege::Owner
    }
}

impl From<Privilege> for u8 {
    fn from(privilege: Privilege) -> Self {
        privilege.level()
    }
}

impl TryFrom<u8> for Privilege {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Privilege::None),
            1 => Ok(Privilege::Guest),
            2 => Ok(Privilege::Owner),
            other => Err(format!("invalid privilege level {}", other)),
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Privilege::None => write!(f, "NONE"),
            Privilege::Guest => write!(f, "GUEST"),
            Privilege::Owner => write!(f, "OWNER"),
        }
    }
}

/// Listing row for a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub preview: Option<String>,
}

/// How a listed document reached the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    /// The caller owns it
    Owned,
    /// Shared with the caller as a guest
    Guest,
}

/// A listed document, flagged by source for client-side highlighting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentEntry {
    #[serde(flatten)]
    pub summary: DocumentSummary,
    pub source: DocumentSource,
}

impl DocumentEntry {
    pub fn is_guest(&self) -> bool {
        self.source == DocumentSource::Guest
    }
}

/// Which documents `get_documents` should return
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Include {
    #[serde(default)]
    pub mine: bool,
    #[serde(default)]
    pub guest: bool,
}

impl Include {
    pub fn mine() -> Self {
        Self {
            mine: true,
            guest: false,
        }
    }

    pub fn guest() -> Self {
        Self {
            mine: false,
            guest: true,
        }
    }

    pub fn all() -> Self {
        Self {
            mine: true,
            guest: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.mine && !self.guest
    }
}

/// Full document as seen by an owner or guest (no preview)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub last_updated: DateTime<Utc>,
    pub owner: AccountRef,
    /// Guests ordered by username
    pub guests: Vec<AccountRef>,
}

/// Result of reading a document
///
/// With privilege NONE only the privilege is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentAccess {
    pub privilege: Privilege,
    #[serde(flatten)]
    pub document: Option<DocumentView>,
}

impl DocumentAccess {
    /// The withheld projection returned when the caller has no access
    pub fn denied() -> Self {
        Self {
            privilege: Privilege::None,
            document: None,
        }
    }
}

/// Returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub account_id: Uuid,
    pub session_id: String,
    pub username: String,
    pub document_count: i64,
}

/// Returned by a successful logout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogoutOutcome {
    pub account_id: Uuid,
    pub deleted_session_id: String,
}

/// Id of a created or rewritten document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentId {
    pub document_id: Uuid,
}

/// Id and title of a renamed or deleted document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentTitle {
    pub id: Uuid,
    pub title: String,
}
