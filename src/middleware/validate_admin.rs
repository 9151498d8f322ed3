use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN_ROLE: &str = "admin";

/// An [`AuthUser`] whose profile carries the admin role.
#[derive(Clone, Debug)]
pub struct AdminUser {
    pub uid: String,
}

/// Middleware that requires the authenticated principal's profile to exist with role `admin`.
/// Must run after [`super::require_bearer`].
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::internal_server_error("Authentication required before admin validation"))?;

    let role = state.roles.get_role(&auth_user.uid).await?;

    if role.as_deref() != Some(ADMIN_ROLE) {
        tracing::warn!(
            "Admin validation failed: '{}' has role {:?}",
            auth_user.uid,
            role
        );
        return Err(ApiError::forbidden("Not an admin"));
    }

    tracing::debug!("Admin validation successful: {}", auth_user.uid);
    request.extensions_mut().insert(AdminUser { uid: auth_user.uid });

    Ok(next.run(request).await)
}
