use axum::{http::StatusCode, response::IntoResponse};

use crate::app::errors;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Dedicated "forbidden" view the guard redirects denied requests to.
pub async fn forbidden() -> impl IntoResponse {
    errors::json_error(
        StatusCode::FORBIDDEN,
        "forbidden",
        "your role does not have access to this page",
    )
}
