pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod services;
pub mod state;

pub use error::ApiError;
pub use router::app;
pub use state::AppState;
