//! Request/response surface
//!
//! One [`Request`] variant per operation, tagged by `op`. A transport
//! deserializes the request, hands it to [`Service::handle`], and sends
//! back either the JSON payload or the [`ApiFailure`].
//!
//! [`Service::handle`]: crate::service::Service::handle

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorKind, ServiceError};
use crate::models::Include;

/// An operation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    CreateAccount {
        username: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    Logout {
        account_id: Uuid,
    },
    GetDocument {
        session_id: String,
        account_id: Uuid,
        document_id: Uuid,
    },
    GetDocuments {
        session_id: String,
        account_id: Uuid,
        #[serde(default)]
        include: Include,
    },
    CreateDocument {
        session_id: String,
        account_id: Uuid,
        title: String,
    },
    RenameDocument {
        session_id: String,
        account_id: Uuid,
        document_id: Uuid,
        title: String,
    },
    DeleteDocument {
        session_id: String,
        account_id: Uuid,
        document_id: Uuid,
    },
    WriteDocContent {
        session_id: String,
        account_id: Uuid,
        document_id: Uuid,
        content: String,
    },
    ShareDocument {
        session_id: String,
        account_id: Uuid,
        document_id: Uuid,
        guest_username: String,
    },
    RemoveShareAccess {
        session_id: String,
        account_id: Uuid,
        document_id: Uuid,
        guest_username: String,
    },
}

impl Request {
    /// Operation name, for logging
    pub fn op(&self) -> &'static str {
        match self {
            Request::CreateAccount { .. } => "createAccount",
            Request::Login { .. } => "login",
            Request::Logout { .. } => "logout",
            Request::GetDocument { .. } => "getDocument",
            Request::GetDocuments { .. } => "getDocuments",
            Request::CreateDocument { .. } => "createDocument",
            Request::RenameDocument { .. } => "renameDocument",
            Request::DeleteDocument { .. } => "deleteDocument",
            Request::WriteDocContent { .. } => "writeDocContent",
            Request::ShareDocument { .. } => "shareDocument",
            Request::RemoveShareAccess { .. } => "removeShareAccess",
        }
    }
}

/// Structured failure sent back to a client
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiFailure {
    /// Stable failure name, e.g. `TitleTaken`
    pub name: String,
    /// Error class, e.g. `ConflictError`
    pub kind: String,
    /// Short user-facing title
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 400 for client errors, 500 for internal ones
    pub code: u16,
}

impl ApiFailure {
    /// Failure for a request body that does not parse
    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        Self {
            name: "MalformedRequest".to_string(),
            kind: ErrorKind::Validation.name().to_string(),
            message: "Malformed request".to_string(),
            description: Some(detail.to_string()),
            code: 400,
        }
    }

    /// Failure for a response that could not be encoded
    pub fn internal() -> Self {
        Self {
            name: "InternalError".to_string(),
            kind: ErrorKind::StoreFailure.name().to_string(),
            message: "Internal error".to_string(),
            description: None,
            code: 500,
        }
    }
}

impl From<&ServiceError> for ApiFailure {
    fn from(err: &ServiceError) -> Self {
        Self {
            name: err.name().to_string(),
            kind: err.kind().name().to_string(),
            message: err.title(),
            description: err.description(),
            code: err.code(),
        }
    }
}

impl From<ServiceError> for ApiFailure {
    fn from(err: ServiceError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_parses_camel_case() {
        let account_id = Uuid::new_v4();
        let document_id = Uuid::new_v4();
        let request: Request = serde_json::from_value(json!({
            "op": "shareDocument",
            "sessionId": "abc",
            "accountId": account_id,
            "documentId": document_id,
            "guestUsername": "bob",
        }))
        .unwrap();

        assert_eq!(
            request,
            Request::ShareDocument {
                session_id: "abc".to_string(),
                account_id,
                document_id,
                guest_username: "bob".to_string(),
            }
        );
        assert_eq!(request.op(), "shareDocument");
    }

    #[test]
    fn test_include_defaults_to_nothing() {
        let request: Request = serde_json::from_value(json!({
            "op": "getDocuments",
            "sessionId": "abc",
            "accountId": Uuid::new_v4(),
        }))
        .unwrap();

        match request {
            Request::GetDocuments { include, .. } => assert!(include.is_empty()),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_rejected() {
        let parsed = serde_json::from_value::<Request>(json!({ "op": "dropTables" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_failure_from_service_error() {
        let failure = ApiFailure::from(ServiceError::UsernameTaken("alice".to_string()));
        assert_eq!(failure.name, "UsernameTaken");
        assert_eq!(failure.kind, "ConflictError");
        assert_eq!(failure.code, 400);
        assert!(failure.description.unwrap().contains("alice"));

        let json = serde_json::to_value(ApiFailure::from(ServiceError::AccessDenied)).unwrap();
        assert_eq!(json["message"], "Access denied");
        assert!(json.get("description").is_none());
    }
}
