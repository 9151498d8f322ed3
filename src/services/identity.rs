use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{CollaboratorError, IdentityStore};

/// Admin client for an identity-toolkit style account API.
pub struct IdentityProviderClient {
    client: Client,
    base_url: String,
    project_id: String,
    cached_auth_header: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityProviderClient {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>, admin_token: Option<&str>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to build identity provider client, using defaults without timeouts: {}", e);
                    Client::new()
                }),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            cached_auth_header: admin_token.map(|t| format!("Bearer {t}")),
        }
    }

    pub fn from_config(config: &crate::config::IdentityConfig) -> Self {
        let token = std::env::var("IDENTITY_ADMIN_TOKEN").ok();
        Self::new(&config.api_base_url, &config.project_id, token.as_deref())
    }

    fn delete_url(&self) -> Result<url::Url, CollaboratorError> {
        let raw = format!("{}/projects/{}/accounts:delete", self.base_url, self.project_id);
        url::Url::parse(&raw).map_err(|e| CollaboratorError::Unavailable(format!("invalid identity API URL: {e}")))
    }
}

#[async_trait]
impl IdentityStore for IdentityProviderClient {
    async fn delete(&self, uid: &str) -> Result<(), CollaboratorError> {
        let mut request = self
            .client
            .post(self.delete_url()?)
            .json(&json!({ "localId": uid }));
        if let Some(header) = &self.cached_auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        if message.starts_with("USER_NOT_FOUND") {
            return Err(CollaboratorError::NotFound(format!("identity {uid}")));
        }
        if status.is_server_error() {
            return Err(CollaboratorError::Unavailable(format!("identity provider returned {status}")));
        }
        Err(CollaboratorError::Rejected(format!("{status}: {message}")))
    }
}
