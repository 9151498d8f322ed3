// handlers/mod.rs - HTTP handlers
//
// admin: bearer + admin role required (/api/admin/*)
// law:   public content generation (/api/law/*)
// health: liveness and service banner

use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::ApiError;

pub mod admin;
pub mod health;
pub mod law;

/// Fallback for any method a route does not serve.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Decode a raw request body as JSON regardless of its content type.
/// An empty body decodes as `{}`.
pub(crate) fn decode_json_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Malformed JSON body: {e}")))
}
