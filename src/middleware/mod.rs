pub mod auth;
pub mod cors;
pub mod validate_admin;

pub use auth::{require_bearer, AuthUser};
pub use cors::{preflight, with_admin_cors};
pub use validate_admin::{require_admin, AdminUser};
