use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use propdesk_auth::AuthError;

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let status = match &err {
        AuthError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        AuthError::RoleNotAllowed { .. } => StatusCode::FORBIDDEN,
        AuthError::SessionExpired | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AuthError::Superseded => StatusCode::CONFLICT,
        AuthError::Transport(_) => StatusCode::BAD_GATEWAY,
        AuthError::MissingOrganizationScope => {
            tracing::error!("session without organization scope reached a scoped handler");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
