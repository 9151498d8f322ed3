use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::extract_bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Principal whose bearer token verified.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub uid: String,
}

/// Bearer authentication middleware: verifies the token and injects [`AuthUser`].
pub async fn require_bearer(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_bearer_token(header_value).ok_or_else(|| {
        tracing::warn!("Request rejected: no bearer token");
        ApiError::unauthorized("No token")
    })?;

    let uid = state.tokens.verify(token).await?;

    request.extensions_mut().insert(AuthUser { uid });
    Ok(next.run(request).await)
}
