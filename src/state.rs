use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::auth::{JwtTokenVerifier, TokenVerifier};
use crate::config::AppConfig;
use crate::database::{DatabaseError, DatabaseManager, PgAuditLog, PgDocumentStore};
use crate::generation::{AttemptPolicy, GenerativeApi};
use crate::services::{
    AuditLog, DocumentStore, FsTemplateStore, IdentityProviderClient, IdentityStore, OpenAiClient, RoleStore,
    TemplateStore,
};

/// Collaborator handles shared by every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<dyn TokenVerifier>,
    pub roles: Arc<dyn RoleStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub audit: Arc<dyn AuditLog>,
    pub templates: Arc<dyn TemplateStore>,
    pub generator: Arc<dyn GenerativeApi>,
    pub attempt_policy: AttemptPolicy,
}

impl AppState {
    /// Build production adapters from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool()?;
        let documents = Arc::new(PgDocumentStore::new(pool.clone()));

        Ok(Self {
            tokens: Arc::new(JwtTokenVerifier::new(&config.security.jwt_secret)),
            roles: documents.clone(),
            identities: Arc::new(IdentityProviderClient::from_config(&config.identity)),
            documents,
            audit: Arc::new(PgAuditLog::new(pool)),
            templates: Arc::new(FsTemplateStore::new(config.templates.dir.clone())),
            generator: Arc::new(OpenAiClient::from_config(&config.generation)),
            attempt_policy: AttemptPolicy::from_config(&config.generation),
        })
    }

    /// Process-wide state, initialized on first call.
    ///
    /// Later calls return the same instance; a failed initialization is not
    /// cached, so the next call tries again.
    pub fn shared() -> Result<&'static AppState, DatabaseError> {
        static STATE: OnceCell<AppState> = OnceCell::new();
        STATE.get_or_try_init(|| {
            tracing::info!("Initializing collaborator clients");
            AppState::from_config(crate::config::config())
        })
    }
}
