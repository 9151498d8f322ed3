use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::handlers::{self, admin, health, law};
use crate::middleware::{preflight, require_admin, require_bearer, with_admin_cors};
use crate::state::AppState;

pub const DELETE_USER_PATH: &str = "/api/admin/deleteUser";
pub const BLOG_PATH: &str = "/api/law/blog";

/// Full application router over the given collaborators.
pub fn app(state: AppState, api: &ApiConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(admin_routes(state.clone()))
        .merge(law_routes())
        .with_state(state)
        // Global middleware
        .layer(RequestBodyLimitLayer::new(api.max_request_size_bytes));

    if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn admin_routes(state: AppState) -> Router<AppState> {
    // route_layer only wraps the POST handler: method checks and preflight
    // never reach authentication. The last layer added runs first.
    let delete_user = post(admin::delete_user)
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .route_layer(from_fn_with_state(state, require_bearer))
        .options(preflight)
        .fallback(handlers::method_not_allowed);

    with_admin_cors(Router::new().route(DELETE_USER_PATH, delete_user))
}

fn law_routes() -> Router<AppState> {
    Router::new().route(
        BLOG_PATH,
        post(law::generate_blog).fallback(handlers::method_not_allowed),
    )
}
