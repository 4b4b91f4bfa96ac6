//! Document lifecycle
//!
//! Every operation validates the session first and resolves privilege
//! before any mutating store call. Create and delete are two store calls
//! each (document row, then the owner's counter); the counter is a cache
//! that [`DocumentManager::reconcile_document_counts`] can rebuild.

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::access::{AccessResolver, ResolvedDocument};
use crate::credentials::{normalize_title, preview_of, valid_title, valid_username};
use crate::error::{ServiceError, ServiceResult, StoreResultExt};
use crate::models::{
    Account, AccountRef, Document, DocumentAccess, DocumentEntry, DocumentId, DocumentSource,
    DocumentTitle, DocumentView, Include,
};
use crate::sessions::SessionManager;
use crate::store::{DataStore, DocumentUpdate};

pub struct DocumentManager<'a> {
    store: &'a dyn DataStore,
    sessions: SessionManager<'a>,
    max_content_length: usize,
}

impl<'a> DocumentManager<'a> {
    pub fn new(
        store: &'a dyn DataStore,
        sessions: SessionManager<'a>,
        max_content_length: usize,
    ) -> Self {
        Self {
            store,
            sessions,
            max_content_length,
        }
    }

    fn resolver(&self) -> AccessResolver<'a> {
        AccessResolver::new(self.store)
    }

    /// Read one document
    ///
    /// Without access, or when the document is gone, only the NONE privilege
    /// comes back. A successful read bumps `last_updated`.
    pub fn get_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<DocumentAccess> {
        self.sessions.validate_session(session_id, account_id)?;

        let (access, document) = match self.resolver().resolve_document(account_id, document_id) {
            Ok(ResolvedDocument {
                access,
                document: Some(document),
            }) => (access, document),
            Ok(_) | Err(ServiceError::DocumentNotFound) => {
                warn!(account_id = %account_id, document_id = %document_id, "denied document read");
                return Ok(DocumentAccess::denied());
            }
            Err(e) => return Err(e),
        };

        let now = Utc::now();
        match self
            .store
            .update_document(document_id, &DocumentUpdate::touch(now))
        {
            Ok(()) => {}
            // Deleted between resolve and touch
            Err(e) if e.is_not_found() => return Ok(DocumentAccess::denied()),
            Err(e) => return Err(e.into()),
        }

        let owner = match self.store.find_account_by_id(document.owner_id)? {
            Some(owner) => account_ref(&owner),
            None => return Ok(DocumentAccess::denied()),
        };
        let guests = self.store.list_guests(document_id)?;

        Ok(DocumentAccess {
            privilege: access.privilege,
            document: Some(DocumentView {
                id: document.id,
                title: document.title,
                content: document.content,
                last_updated: now,
                owner,
                guests,
            }),
        })
    }

    /// List owned and/or shared documents, owned entries first
    pub fn get_documents(
        &self,
        session_id: &str,
        account_id: Uuid,
        include: Include,
    ) -> ServiceResult<Vec<DocumentEntry>> {
        let account = self.sessions.validate_session(session_id, account_id)?;

        let mut entries = Vec::new();
        if include.is_empty() {
            return Ok(entries);
        }

        if include.mine {
            entries.extend(
                self.store
                    .list_owned_documents(account.id)?
                    .into_iter()
                    .map(|summary| DocumentEntry {
                        summary,
                        source: DocumentSource::Owned,
                    }),
            );
        }
        if include.guest {
            entries.extend(
                self.store
                    .list_guest_documents(account.id)?
                    .into_iter()
                    .map(|summary| DocumentEntry {
                        summary,
                        source: DocumentSource::Guest,
                    }),
            );
        }

        Ok(entries)
    }

    /// Create an empty document owned by the caller
    pub fn create_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        title: &str,
    ) -> ServiceResult<DocumentId> {
        if !valid_title(title) {
            return Err(ServiceError::InvalidTitle);
        }

        let account = self.sessions.validate_session(session_id, account_id)?;
        let title = normalize_title(title);

        if self
            .store
            .count_documents_by_owner_and_title(account.id, &title)?
            > 0
        {
            return Err(ServiceError::TitleTaken);
        }

        let document = Document::new(account.id, title);
        self.store
            .insert_document(&document)
            .or_conflict(|| ServiceError::TitleTaken)?;

        if let Err(e) = self.store.increment_account_document_count(account.id) {
            error!(
                account_id = %account.id,
                document_id = %document.id,
                error = %e,
                "document created but owner count not incremented"
            );
            return Err(e.into());
        }

        info!(account_id = %account.id, document_id = %document.id, "created document");
        Ok(DocumentId {
            document_id: document.id,
        })
    }

    /// Rename a document the caller owns
    pub fn rename_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        title: &str,
    ) -> ServiceResult<DocumentTitle> {
        if !valid_title(title) {
            return Err(ServiceError::InvalidTitle);
        }

        self.sessions.validate_session(session_id, account_id)?;
        let document = self.require_owner(account_id, document_id)?;
        let title = normalize_title(title);

        if self
            .store
            .count_documents_by_owner_and_title(document.owner_id, &title)?
            > 0
        {
            return Err(ServiceError::TitleTaken);
        }

        let update = DocumentUpdate {
            title: Some(title.clone()),
            last_updated: Some(Utc::now()),
            ..DocumentUpdate::default()
        };
        self.store
            .update_document(document_id, &update)
            .map_err(|e| match e {
                e if e.is_not_found() => ServiceError::DocumentNotFound,
                e if e.is_unique_violation() => ServiceError::TitleTaken,
                e => e.into(),
            })?;

        info!(document_id = %document_id, "renamed document");
        Ok(DocumentTitle {
            id: document_id,
            title,
        })
    }

    /// Delete a document the caller owns and decrement their count
    pub fn delete_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<DocumentTitle> {
        self.sessions.validate_session(session_id, account_id)?;
        let document = self.require_owner(account_id, document_id)?;
        self.remove_document(document.id, document.owner_id)
    }

    /// Delete `title` owned by `username` without a session
    ///
    /// Administrative path; keeps the owner's counter in step like
    /// [`delete_document`](Self::delete_document).
    pub fn purge_document(&self, username: &str, title: &str) -> ServiceResult<DocumentTitle> {
        let owner = self
            .store
            .find_account_by_username(username)?
            .ok_or_else(|| ServiceError::AccountNotFound(username.to_string()))?;
        let document = self
            .store
            .find_document_by_owner_and_title(owner.id, &normalize_title(title))?
            .ok_or(ServiceError::DocumentNotFound)?;

        self.remove_document(document.id, owner.id)
    }

    fn remove_document(&self, document_id: Uuid, owner_id: Uuid) -> ServiceResult<DocumentTitle> {
        let deleted = self
            .store
            .delete_document_by_id(document_id)
            .or_not_found(|| ServiceError::DocumentNotFound)?;

        if let Err(e) = self.store.decrement_account_document_count(owner_id) {
            error!(
                account_id = %owner_id,
                document_id = %document_id,
                error = %e,
                "document deleted but owner count not decremented"
            );
            return Err(e.into());
        }

        info!(account_id = %owner_id, document_id = %document_id, "deleted document");
        Ok(DocumentTitle {
            id: deleted.id,
            title: deleted.title,
        })
    }

    /// Replace the content of a document the caller owns
    ///
    /// Oversized content is rejected before the session is looked at.
    pub fn write_doc_content(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        content: &str,
    ) -> ServiceResult<DocumentId> {
        let len = content.chars().count();
        if len > self.max_content_length {
            return Err(ServiceError::ContentTooLarge {
                len,
                max: self.max_content_length,
            });
        }

        self.sessions.validate_session(session_id, account_id)?;
        self.require_owner(account_id, document_id)?;

        let update = DocumentUpdate {
            content: Some(content.to_string()),
            preview: Some(preview_of(content)),
            last_updated: Some(Utc::now()),
            ..DocumentUpdate::default()
        };
        self.store
            .update_document(document_id, &update)
            .or_not_found(|| ServiceError::DocumentNotFound)?;

        Ok(DocumentId { document_id })
    }

    /// Grant `guest_username` read access
    pub fn share_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        guest_username: &str,
    ) -> ServiceResult<AccountRef> {
        self.sessions.validate_session(session_id, account_id)?;
        self.require_owner(account_id, document_id)?;
        let guest = self.find_guest(account_id, guest_username)?;

        if self.store.count_guest_edge(document_id, guest.id)? > 0 {
            return Err(ServiceError::AlreadyShared(guest_username.to_string()));
        }

        self.store
            .add_guest_edge(document_id, guest.id)
            .or_conflict(|| ServiceError::AlreadyShared(guest_username.to_string()))?;

        info!(document_id = %document_id, guest_id = %guest.id, "shared document");
        Ok(guest)
    }

    /// Revoke the read access of `guest_username`
    pub fn remove_share_access(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        guest_username: &str,
    ) -> ServiceResult<AccountRef> {
        self.sessions.validate_session(session_id, account_id)?;
        self.require_owner(account_id, document_id)?;
        let guest = self.find_guest(account_id, guest_username)?;

        if self.store.count_guest_edge(document_id, guest.id)? == 0 {
            return Err(ServiceError::NotAGuest(guest_username.to_string()));
        }

        self.store
            .remove_guest_edge(document_id, guest.id)
            .or_not_found(|| ServiceError::NotAGuest(guest_username.to_string()))?;

        info!(document_id = %document_id, guest_id = %guest.id, "revoked guest access");
        Ok(guest)
    }

    /// Recount owned documents and rewrite drifted counters
    ///
    /// Returns the accounts whose counter was corrected, with the new value.
    pub fn reconcile_document_counts(&self) -> ServiceResult<Vec<Account>> {
        let mut corrected = Vec::new();

        for mut account in self.store.list_accounts()? {
            let actual = count_as_i64(self.store.count_documents_by_owner(account.id)?);
            if actual == account.document_count {
                continue;
            }

            warn!(
                account_id = %account.id,
                stored = account.document_count,
                actual,
                "document count drifted"
            );
            self.store.set_account_document_count(account.id, actual)?;
            account.document_count = actual;
            corrected.push(account);
        }

        Ok(corrected)
    }

    fn require_owner(&self, account_id: Uuid, document_id: Uuid) -> ServiceResult<Document> {
        self.resolver()
            .require_owner(account_id, document_id)
            .inspect_err(|e| {
                if matches!(e, ServiceError::AccessDenied) {
                    warn!(account_id = %account_id, document_id = %document_id, "denied document mutation");
                }
            })
    }

    fn find_guest(&self, account_id: Uuid, guest_username: &str) -> ServiceResult<AccountRef> {
        if !valid_username(guest_username) {
            return Err(ServiceError::InvalidGuestUsername);
        }

        let guest = self
            .store
            .find_account_by_username(guest_username)?
            .ok_or_else(|| ServiceError::AccountNotFound(guest_username.to_string()))?;

        if guest.id == account_id {
            return Err(ServiceError::SelfShare);
        }

        Ok(account_ref(&guest))
    }
}

fn account_ref(account: &Account) -> AccountRef {
    AccountRef {
        id: account.id,
        username: account.username.clone(),
    }
}

fn count_as_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountManager;
    use crate::hasher::Argon2Hasher;
    use crate::models::{LoginOutcome, Privilege};
    use crate::test_support::{fast_hasher, FaultyStore, TestEnv};

    const MAX: usize = 16_381;

    struct Fixture {
        env: TestEnv,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                env: TestEnv::new(),
            }
        }

        fn docs(&self) -> DocumentManager<'_> {
            DocumentManager::new(&self.env.store, self.env.sessions(), MAX)
        }

        fn login(&self, name: &str) -> LoginOutcome {
            self.env.register_and_login(name, "hunter22")
        }

        fn count(&self, account_id: Uuid) -> i64 {
            self.env
                .store
                .find_account_by_id(account_id)
                .unwrap()
                .unwrap()
                .document_count
        }
    }

    #[test]
    fn test_create_then_read() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();

        let created = docs
            .create_document(&alice.session_id, alice.account_id, "  Notes ")
            .unwrap();
        let read = docs
            .get_document(&alice.session_id, alice.account_id, created.document_id)
            .unwrap();

        assert_eq!(read.privilege, Privilege::Owner);
        let view = read.document.unwrap();
        assert_eq!(view.title, "Notes");
        assert_eq!(view.content, "");
        assert_eq!(view.owner.username, "alice");
        assert!(view.guests.is_empty());
        assert_eq!(fx.count(alice.account_id), 1);
    }

    #[test]
    fn test_create_rejects_bad_title_before_session() {
        let fx = Fixture::new();
        let docs = fx.docs();

        // Bad session too, but the title is checked first
        assert!(matches!(
            docs.create_document("bogus", Uuid::new_v4(), "   "),
            Err(ServiceError::InvalidTitle)
        ));
        assert!(matches!(
            docs.create_document("bogus", Uuid::new_v4(), "Notes"),
            Err(ServiceError::InvalidSession)
        ));
    }

    #[test]
    fn test_title_unique_per_owner() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let bob = fx.login("bob");
        let docs = fx.docs();

        docs.create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap();
        assert!(matches!(
            docs.create_document(&alice.session_id, alice.account_id, " Notes"),
            Err(ServiceError::TitleTaken)
        ));
        // Another owner may reuse it
        docs.create_document(&bob.session_id, bob.account_id, "Notes")
            .unwrap();
        assert_eq!(fx.count(alice.account_id), 1);
    }

    #[test]
    fn test_rename() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let bob = fx.login("bob");
        let docs = fx.docs();

        let a = docs
            .create_document(&alice.session_id, alice.account_id, "Draft")
            .unwrap()
            .document_id;
        docs.create_document(&alice.session_id, alice.account_id, "Final")
            .unwrap();

        let renamed = docs
            .rename_document(&alice.session_id, alice.account_id, a, "My   draft")
            .unwrap();
        assert_eq!(renamed.title, "My draft");

        assert!(matches!(
            docs.rename_document(&alice.session_id, alice.account_id, a, "Final"),
            Err(ServiceError::TitleTaken)
        ));
        assert!(matches!(
            docs.rename_document(&alice.session_id, alice.account_id, a, "My draft"),
            Err(ServiceError::TitleTaken)
        ));
        assert!(matches!(
            docs.rename_document(&bob.session_id, bob.account_id, a, "Mine now"),
            Err(ServiceError::AccessDenied)
        ));
        assert!(matches!(
            docs.rename_document(&alice.session_id, alice.account_id, a, ""),
            Err(ServiceError::InvalidTitle)
        ));
    }

    #[test]
    fn test_write_content_and_preview() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();
        let id = docs
            .create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap()
            .document_id;

        let long = "y".repeat(500);
        docs.write_doc_content(&alice.session_id, alice.account_id, id, &long)
            .unwrap();

        let view = docs
            .get_document(&alice.session_id, alice.account_id, id)
            .unwrap()
            .document
            .unwrap();
        assert_eq!(view.content, long);

        let listed = docs
            .get_documents(&alice.session_id, alice.account_id, Include::mine())
            .unwrap();
        assert_eq!(
            listed[0].summary.preview.as_deref(),
            Some("y".repeat(127).as_str())
        );

        docs.write_doc_content(&alice.session_id, alice.account_id, id, "")
            .unwrap();
        let listed = docs
            .get_documents(&alice.session_id, alice.account_id, Include::mine())
            .unwrap();
        assert_eq!(listed[0].summary.preview, None);
    }

    #[test]
    fn test_write_size_limit_checked_first() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();
        let id = docs
            .create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap()
            .document_id;

        assert!(matches!(
            docs.write_doc_content("bogus", Uuid::new_v4(), id, &"x".repeat(MAX + 1)),
            Err(ServiceError::ContentTooLarge { len: 16_382, .. })
        ));
        docs.write_doc_content(&alice.session_id, alice.account_id, id, &"x".repeat(MAX))
            .unwrap();
    }

    #[test]
    fn test_guest_cannot_write() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let bob = fx.login("bob");
        let docs = fx.docs();
        let id = docs
            .create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap()
            .document_id;
        docs.share_document(&alice.session_id, alice.account_id, id, "bob")
            .unwrap();

        assert!(matches!(
            docs.write_doc_content(&bob.session_id, bob.account_id, id, "mine"),
            Err(ServiceError::AccessDenied)
        ));
        assert!(matches!(
            docs.delete_document(&bob.session_id, bob.account_id, id),
            Err(ServiceError::AccessDenied)
        ));
        assert!(matches!(
            docs.share_document(&bob.session_id, bob.account_id, id, "alice"),
            Err(ServiceError::AccessDenied)
        ));
    }

    #[test]
    fn test_stranger_gets_only_privilege() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let carol = fx.login("carol");
        let docs = fx.docs();
        let id = docs
            .create_document(&alice.session_id, alice.account_id, "Secret")
            .unwrap()
            .document_id;

        let read = docs
            .get_document(&carol.session_id, carol.account_id, id)
            .unwrap();
        assert_eq!(read, DocumentAccess::denied());
    }

    #[test]
    fn test_share_and_unshare() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let bob = fx.login("bob");
        let docs = fx.docs();
        let id = docs
            .create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap()
            .document_id;

        assert!(matches!(
            docs.share_document(&alice.session_id, alice.account_id, id, "b!"),
            Err(ServiceError::InvalidGuestUsername)
        ));
        assert!(matches!(
            docs.share_document(&alice.session_id, alice.account_id, id, "nobody"),
            Err(ServiceError::AccountNotFound(_))
        ));
        assert!(matches!(
            docs.share_document(&alice.session_id, alice.account_id, id, "alice"),
            Err(ServiceError::SelfShare)
        ));
        assert!(matches!(
            docs.remove_share_access(&alice.session_id, alice.account_id, id, "alice"),
            Err(ServiceError::SelfShare)
        ));

        docs.share_document(&alice.session_id, alice.account_id, id, "bob")
            .unwrap();
        assert!(matches!(
            docs.share_document(&alice.session_id, alice.account_id, id, "bob"),
            Err(ServiceError::AlreadyShared(_))
        ));

        let resolver = AccessResolver::new(&fx.env.store);
        assert_eq!(
            resolver.resolve(bob.account_id, id).unwrap().privilege,
            Privilege::Guest
        );

        let owner_view = docs
            .get_document(&alice.session_id, alice.account_id, id)
            .unwrap()
            .document
            .unwrap();
        assert_eq!(owner_view.guests.len(), 1);
        assert_eq!(owner_view.guests[0].username, "bob");

        docs.remove_share_access(&alice.session_id, alice.account_id, id, "bob")
            .unwrap();
        assert_eq!(
            resolver.resolve(bob.account_id, id).unwrap().privilege,
            Privilege::None
        );

        // Second removal fails cleanly and leaves the guest set alone
        assert!(matches!(
            docs.remove_share_access(&alice.session_id, alice.account_id, id, "bob"),
            Err(ServiceError::NotAGuest(_))
        ));
        assert!(fx.env.store.list_guests(id).unwrap().is_empty());
    }

    #[test]
    fn test_get_documents_include_flags() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let bob = fx.login("bob");
        let docs = fx.docs();

        let shared = docs
            .create_document(&alice.session_id, alice.account_id, "Shared")
            .unwrap()
            .document_id;
        docs.share_document(&alice.session_id, alice.account_id, shared, "bob")
            .unwrap();
        docs.create_document(&bob.session_id, bob.account_id, "Own")
            .unwrap();

        let none = docs
            .get_documents(&bob.session_id, bob.account_id, Include::default())
            .unwrap();
        assert!(none.is_empty());

        let mine = docs
            .get_documents(&bob.session_id, bob.account_id, Include::mine())
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert!(!mine[0].is_guest());

        let all = docs
            .get_documents(&bob.session_id, bob.account_id, Include::all())
            .unwrap();
        assert_eq!(all.len(), 2);
        let guest = all.iter().find(|e| e.is_guest()).unwrap();
        assert_eq!(guest.summary.id, shared);
    }

    #[test]
    fn test_delete_restores_count() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();

        let before = fx.count(alice.account_id);
        let id = docs
            .create_document(&alice.session_id, alice.account_id, "Temp")
            .unwrap()
            .document_id;
        let deleted = docs
            .delete_document(&alice.session_id, alice.account_id, id)
            .unwrap();

        assert_eq!(deleted.title, "Temp");
        assert_eq!(fx.count(alice.account_id), before);
        assert_eq!(
            docs.get_document(&alice.session_id, alice.account_id, id)
                .unwrap(),
            DocumentAccess::denied()
        );
        assert!(matches!(
            docs.delete_document(&alice.session_id, alice.account_id, id),
            Err(ServiceError::AccessDenied)
        ));
    }

    #[test]
    fn test_purge_document() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();
        docs.create_document(&alice.session_id, alice.account_id, "Old notes")
            .unwrap();

        let purged = docs.purge_document("alice", "Old   notes").unwrap();
        assert_eq!(purged.title, "Old notes");
        assert_eq!(fx.count(alice.account_id), 0);

        assert!(matches!(
            docs.purge_document("alice", "Old notes"),
            Err(ServiceError::DocumentNotFound)
        ));
        assert!(matches!(
            docs.purge_document("nobody", "Old notes"),
            Err(ServiceError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_reconcile_document_counts() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let bob = fx.login("bob");
        let docs = fx.docs();
        docs.create_document(&alice.session_id, alice.account_id, "One")
            .unwrap();
        docs.create_document(&alice.session_id, alice.account_id, "Two")
            .unwrap();

        fx.env
            .store
            .set_account_document_count(alice.account_id, 7)
            .unwrap();

        let corrected = docs.reconcile_document_counts().unwrap();
        assert_eq!(corrected.len(), 1);
        assert_eq!(corrected[0].id, alice.account_id);
        assert_eq!(corrected[0].document_count, 2);
        assert_eq!(fx.count(alice.account_id), 2);
        assert_eq!(fx.count(bob.account_id), 0);

        assert!(docs.reconcile_document_counts().unwrap().is_empty());
    }

    #[test]
    fn test_alice_shares_with_bob_then_deletes() {
        let fx = Fixture::new();
        let alice = fx.login("alice");
        let bob = fx.login("bob");
        let docs = fx.docs();

        let d = docs
            .create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap()
            .document_id;
        assert_eq!(fx.count(alice.account_id), 1);

        docs.write_doc_content(&alice.session_id, alice.account_id, d, "hello")
            .unwrap();
        let view = docs
            .get_document(&alice.session_id, alice.account_id, d)
            .unwrap()
            .document
            .unwrap();
        assert_eq!(view.content, "hello");
        let listed = docs
            .get_documents(&alice.session_id, alice.account_id, Include::mine())
            .unwrap();
        assert_eq!(listed[0].summary.preview.as_deref(), Some("hello"));

        docs.share_document(&alice.session_id, alice.account_id, d, "bob")
            .unwrap();
        let bob_read = docs
            .get_document(&bob.session_id, bob.account_id, d)
            .unwrap();
        assert_eq!(bob_read.privilege, Privilege::Guest);
        let bob_list = docs
            .get_documents(&bob.session_id, bob.account_id, Include::guest())
            .unwrap();
        assert_eq!(bob_list.len(), 1);
        assert_eq!(bob_list[0].summary.id, d);
        assert!(bob_list[0].is_guest());

        docs.delete_document(&alice.session_id, alice.account_id, d)
            .unwrap();
        assert_eq!(fx.count(alice.account_id), 0);
        assert_eq!(
            docs.get_document(&bob.session_id, bob.account_id, d)
                .unwrap()
                .privilege,
            Privilege::None
        );
    }

    struct FaultyFixture {
        store: FaultyStore,
        hasher: Argon2Hasher,
    }

    impl FaultyFixture {
        fn new() -> Self {
            Self {
                store: FaultyStore::new(),
                hasher: fast_hasher(),
            }
        }

        fn docs(&self) -> DocumentManager<'_> {
            DocumentManager::new(
                &self.store,
                SessionManager::new(&self.store, &self.hasher),
                MAX,
            )
        }

        fn login(&self, name: &str) -> LoginOutcome {
            AccountManager::new(&self.store, &self.hasher)
                .create_account(name, "hunter22")
                .unwrap();
            SessionManager::new(&self.store, &self.hasher)
                .login(name, "hunter22")
                .unwrap()
        }

        fn count(&self, account_id: Uuid) -> i64 {
            self.store
                .find_account_by_id(account_id)
                .unwrap()
                .unwrap()
                .document_count
        }
    }

    #[test]
    fn test_create_reports_failed_increment() {
        let fx = FaultyFixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();

        fx.store.fail_counters.set(true);
        let err = docs
            .create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(err.code(), 500);

        // The row was written, only the counter lags behind
        assert_eq!(fx.store.count_documents_by_owner(alice.account_id).unwrap(), 1);
        assert_eq!(fx.count(alice.account_id), 0);

        fx.store.fail_counters.set(false);
        let corrected = docs.reconcile_document_counts().unwrap();
        assert_eq!(corrected.len(), 1);
        assert_eq!(fx.count(alice.account_id), 1);
    }

    #[test]
    fn test_delete_reports_failed_decrement() {
        let fx = FaultyFixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();
        let id = docs
            .create_document(&alice.session_id, alice.account_id, "Notes")
            .unwrap()
            .document_id;
        assert_eq!(fx.count(alice.account_id), 1);

        fx.store.fail_counters.set(true);
        let err = docs
            .delete_document(&alice.session_id, alice.account_id, id)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(err.code(), 500);

        assert!(fx.store.find_document_by_id(id).unwrap().is_none());
        assert_eq!(fx.count(alice.account_id), 1);

        fx.store.fail_counters.set(false);
        docs.reconcile_document_counts().unwrap();
        assert_eq!(fx.count(alice.account_id), 0);
    }

    #[test]
    fn test_rename_unique_index_maps_to_title_taken() {
        let fx = FaultyFixture::new();
        let alice = fx.login("alice");
        let docs = fx.docs();
        let draft = docs
            .create_document(&alice.session_id, alice.account_id, "Draft")
            .unwrap()
            .document_id;
        docs.create_document(&alice.session_id, alice.account_id, "Final")
            .unwrap();

        fx.store.skip_title_check.set(true);
        assert!(matches!(
            docs.rename_document(&alice.session_id, alice.account_id, draft, "Final"),
            Err(ServiceError::TitleTaken)
        ));
        assert!(matches!(
            docs.create_document(&alice.session_id, alice.account_id, "Final"),
            Err(ServiceError::TitleTaken)
        ));
        assert_eq!(
            fx.store.find_document_by_id(draft).unwrap().unwrap().title,
            "Draft"
        );
    }
}
