// External collaborators: identity provider, profile documents, audit log,
// prompt templates and the generative API. Each seam is a trait so handlers
// can run against real adapters or test stubs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod account_service;
pub mod identity;
pub mod openai;
pub mod templates;

pub use account_service::{delete_user_cascade, CascadeError, CascadeStep};
pub use identity::IdentityProviderClient;
pub use openai::OpenAiClient;
pub use templates::{FsTemplateStore, TemplateError, TemplateStore};

/// Failures reported by identity, document and audit collaborators.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected by upstream: {0}")]
    Rejected(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Database(#[from] crate::database::manager::DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// `collection/id` address of a profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    pub collection: String,
    pub id: String,
}

impl DocumentPath {
    pub const USERS: &'static str = "users";

    pub fn user(uid: &str) -> Self {
        Self {
            collection: Self::USERS.to_string(),
            id: uid.to_string(),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    DeleteUser,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::DeleteUser => "DELETE_USER",
        }
    }
}

/// An admin action to record. The timestamp is assigned by the log itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub actor_uid: String,
    pub action: AuditAction,
    pub target_uid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn delete(&self, uid: &str) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Role attribute of the principal's profile, `None` when no profile exists.
    async fn get_role(&self, uid: &str) -> Result<Option<String>, CollaboratorError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn delete(&self, path: &DocumentPath) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditRecord, CollaboratorError>;
}
