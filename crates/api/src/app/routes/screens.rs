//! Screen routes.
//!
//! The UI renders screens; this service only tells it what the current
//! session may render on a given path.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, OriginalUri},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionContext;

/// Fallback handler for every guarded path.
///
/// Unmapped paths get past the guard under the fail-open policy but have no
/// screen behind them.
pub async fn screen(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    OriginalUri(uri): OriginalUri,
) -> axum::response::Response {
    let path = uri.path();
    let Some(module) = services.access.routes().resolve_module(path) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "no screen at this path");
    };

    let session = ctx.session();
    let organization_id = match session.require_organization() {
        Ok(id) => id.clone(),
        Err(err) => return errors::auth_error_to_response(err),
    };

    Json(dto::ScreenContext {
        path: path.to_string(),
        module,
        user: dto::UserSummary {
            id: session.user.id.clone(),
            email: session.user.email.clone(),
            name: session.user.name(),
        },
        role: session.role.clone(),
        organization_id,
    })
    .into_response()
}
