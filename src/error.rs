// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::TokenError;
use crate::database::DatabaseError;
use crate::generation::{GenerationError, GenerativeError, PromptError, RequestError};
use crate::services::{CascadeError, CascadeStep, CollaboratorError, TemplateError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed
    MethodNotAllowed,

    // 500 Internal Server Error
    InternalServerError {
        message: String,
        detail: Option<String>,
    },

    // 500, generation never produced a valid article
    GenerationFailed {
        message: String,
        debug_preview: String,
    },

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    // 504 Gateway Timeout
    GatewayTimeout(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InternalServerError { .. } | ApiError::GenerationFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed => "Method Not Allowed",
            ApiError::InternalServerError { message, .. } => message,
            ApiError::GenerationFailed { message, .. } => message,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
            ApiError::GatewayTimeout(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::GenerationFailed { .. } => "GENERATION_VALIDATION_FAILED",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::GatewayTimeout(_) => "GATEWAY_TIMEOUT",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.message(),
            "code": self.error_code(),
        });

        match self {
            ApiError::GenerationFailed { debug_preview, .. } => {
                body["debug_preview"] = json!(debug_preview);
            }
            ApiError::InternalServerError {
                detail: Some(detail), ..
            } => {
                body["detail"] = json!(detail);
            }
            _ => {}
        }

        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            detail: None,
        }
    }

    /// 500 whose cause is attached only when detail exposure is enabled.
    pub fn internal_with_cause(message: impl Into<String>, cause: &dyn std::error::Error) -> Self {
        let detail = crate::config::config()
            .security
            .expose_error_details
            .then(|| error_chain(cause));
        ApiError::InternalServerError {
            message: message.into(),
            detail,
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        ApiError::GatewayTimeout(message.into())
    }
}

/// `outer: inner: root` rendering of an error and its sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

// Convert other error types to ApiError
impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSecret | TokenError::InvalidExpiry(_) | TokenError::Generation(_) => {
                tracing::error!("Token verification unavailable: {}", err);
                ApiError::internal_server_error("Authentication is not configured")
            }
            TokenError::Invalid(_) | TokenError::MissingSubject => {
                tracing::warn!("Rejected bearer token: {}", err);
                ApiError::unauthorized("Invalid token")
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlx(ref sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_with_cause("Database error occurred", &err)
            }
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::InvalidIdentifier(_) => {
                tracing::error!("Database identifier rejected: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::NotFound(ref what) => ApiError::not_found(format!("{what} not found")),
            CollaboratorError::Database(inner) => inner.into(),
            ref other => {
                tracing::error!("Collaborator error: {}", other);
                ApiError::internal_with_cause("An error occurred while processing your request", other)
            }
        }
    }
}

impl From<CascadeError> for ApiError {
    fn from(err: CascadeError) -> Self {
        match (&err.failed, &err.source) {
            (CascadeStep::DeleteIdentity, CollaboratorError::NotFound(_)) => ApiError::not_found("User not found"),
            _ if err.is_partial() => ApiError::internal_with_cause(
                format!("User identity deleted but {} failed", err.failed.as_str()),
                &err,
            ),
            _ => ApiError::internal_with_cause("Failed to delete user", &err),
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        tracing::error!("Prompt template load failed: {}", err);
        ApiError::internal_with_cause("Prompt templates unavailable", &err)
    }
}

impl From<PromptError> for ApiError {
    fn from(err: PromptError) -> Self {
        tracing::error!("Prompt assembly failed: {}", err);
        ApiError::internal_with_cause("Prompt templates unavailable", &err)
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Exhausted { debug_preview, .. } => ApiError::GenerationFailed {
                message: "Output failed validation after retries".to_string(),
                debug_preview,
            },
            GenerationError::Generative(GenerativeError::Timeout(after)) => {
                tracing::error!("Generative API timed out after {:?}", after);
                ApiError::gateway_timeout("Generative API timed out")
            }
            GenerationError::Generative(other) => {
                tracing::error!("Generative API failure: {}", other);
                ApiError::bad_gateway("Generative API request failed")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
