//! Access audit endpoints: answer "why can(not) I open this page?".

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
};

use crate::app::{dto, services::AppServices};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/modules", get(list_modules))
        .route("/explain", get(explain))
}

/// GET /access/modules - modules the current role may use.
pub async fn list_modules(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> impl IntoResponse {
    let role = &ctx.session().role;
    Json(serde_json::json!({
        "role": role,
        "modules": services.access.allowed_modules(role),
    }))
}

/// GET /access/explain?path=/listings/abc - explain the decision for a path.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<dto::ExplainQuery>,
) -> impl IntoResponse {
    Json(services.access.explain_route_access(&ctx.session().role, &query.path))
}
