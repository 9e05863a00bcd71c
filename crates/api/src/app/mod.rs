//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: evaluator, guard, credentials transport, session store
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware::{self, GuardState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let guard_state = GuardState {
        guard: services.guard.clone(),
        sessions: services.sessions.clone(),
    };

    // Session-scoped endpoints: signed in, no route-to-module check.
    let session_scoped = routes::router().layer(axum::middleware::from_fn_with_state(
        guard_state.clone(),
        middleware::session_middleware,
    ));

    // Screens: everything else, guarded by the route table.
    let screens = Router::new()
        .fallback(routes::screens::screen)
        .layer(axum::middleware::from_fn_with_state(
            guard_state,
            middleware::guard_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route(middleware::FORBIDDEN_PATH, get(routes::system::forbidden))
        .nest("/auth", routes::auth::router())
        .merge(session_scoped)
        .merge(screens)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
