//! Privilege resolution
//!
//! Every document read and write asks [`AccessResolver::resolve`] before
//! branching. It never mutates state.

use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Document, Privilege};
use crate::store::DataStore;

/// Resolved access of one account on one document
///
/// Carries no document data, so a NONE result leaks nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub privilege: Privilege,
    pub accessible: bool,
}

impl Access {
    fn new(privilege: Privilege) -> Self {
        Self {
            privilege,
            accessible: privilege.can_read(),
        }
    }
}

/// Access plus the document fetched while resolving it
///
/// The document is only present when the caller may read it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedDocument {
    pub access: Access,
    pub document: Option<Document>,
}

pub struct AccessResolver<'a> {
    store: &'a dyn DataStore,
}

impl<'a> AccessResolver<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Compute the privilege of `account_id` on `document_id`
    ///
    /// Fails with `DocumentNotFound` when the document does not exist.
    pub fn resolve(&self, account_id: Uuid, document_id: Uuid) -> ServiceResult<Access> {
        self.resolve_document(account_id, document_id)
            .map(|resolved| resolved.access)
    }

    pub(crate) fn resolve_document(
        &self,
        account_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<ResolvedDocument> {
        let document = self
            .store
            .find_document_by_id(document_id)?
            .ok_or(ServiceError::DocumentNotFound)?;

        let privilege = if document.owner_id == account_id {
            Privilege::Owner
        } else if self.store.count_guest_edge(document_id, account_id)? > 0 {
            Privilege::Guest
        } else {
            Privilege::None
        };

        let access = Access::new(privilege);
        Ok(ResolvedDocument {
            access,
            document: access.accessible.then_some(document),
        })
    }

    /// Resolve and require ownership
    ///
    /// An absent document is reported as `AccessDenied`, same as a document
    /// owned by someone else.
    pub fn require_owner(&self, account_id: Uuid, document_id: Uuid) -> ServiceResult<Document> {
        match self.resolve_document(account_id, document_id) {
            Ok(ResolvedDocument {
                access,
                document: Some(document),
            }) if access.privilege.is_owner() => Ok(document),
            Ok(_) | Err(ServiceError::DocumentNotFound) => Err(ServiceError::AccessDenied),
            Err(e) => Err(e),
        }
    }
}
