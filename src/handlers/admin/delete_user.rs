// handlers/admin/delete_user.rs - POST /api/admin/deleteUser handler

use axum::{body::Bytes, extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::decode_json_body;
use crate::middleware::AdminUser;
use crate::services::delete_user_cascade;
use crate::state::AppState;

/// POST /api/admin/deleteUser - Delete a user's identity and profile
///
/// Expected Input:
/// ```json
/// { "uid": "string" }   // Required: id of the account to delete
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "ok": true }
/// ```
///
/// The identity record, the `users/<uid>` profile document and an audit entry
/// are handled in that order. A failure after the identity is gone is
/// reported as a 500 but earlier steps are not undone.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = decode_json_body(&body)?;
    let uid = target_uid(&body).ok_or_else(|| ApiError::bad_request("uid missing"))?;

    tracing::info!("Admin {} requested deletion of {}", admin.uid, uid);

    delete_user_cascade(
        state.identities.as_ref(),
        state.documents.as_ref(),
        state.audit.as_ref(),
        &admin.uid,
        uid,
    )
    .await?;

    Ok(Json(json!({ "ok": true })))
}

/// The uid exactly as sent. Blank or whitespace-padded ids are rejected, not repaired.
fn target_uid(body: &Value) -> Option<&str> {
    body.get("uid")
        .and_then(Value::as_str)
        .filter(|uid| !uid.is_empty() && uid.trim() == *uid)
}
