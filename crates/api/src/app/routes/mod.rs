use axum::Router;

pub mod access;
pub mod auth;
pub mod screens;
pub mod system;

/// Router for endpoints that need a signed-in session but map to no screen.
pub fn router() -> Router {
    Router::new().nest("/access", access::router())
}
