//! Sign-in / sign-out / refresh endpoints.
//!
//! These sit outside the route guard: they manage the session the guard
//! later reads.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use propdesk_auth::{AuthError, Credentials};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionKey;

pub fn router() -> Router {
    Router::new()
        .route("/signin", get(sign_in_page).post(sign_in))
        .route("/signout", post(sign_out))
        .route("/refresh", post(refresh))
        .route("/session", get(current_session))
}

/// GET /auth/signin - what the sign-in form needs.
pub async fn sign_in_page(Query(query): Query<dto::SignInQuery>) -> impl IntoResponse {
    Json(serde_json::json!({
        "fields": ["email", "password"],
        "callbackUrl": query.callback_url.unwrap_or_else(|| "/".to_string()),
    }))
}

/// POST /auth/signin - exchange credentials and start a session.
pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> axum::response::Response {
    // A new sign-in always gets a new key; the old session is dropped.
    if let Some(previous) = SessionKey::from_headers(&headers) {
        services.sessions.remove(&previous);
    }

    let (key, manager) = services.sessions.create();
    match manager
        .sign_in(services.exchange.as_ref(), &credentials, Utc::now())
        .await
    {
        Ok(session) => {
            let summary =
                dto::SessionSummary::new(&session, services.access.allowed_modules(&session.role));
            let cookie = key.cookie(services.session_config.max_age_secs, services.secure_cookies);
            (StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(summary)).into_response()
        }
        Err(err) => {
            services.sessions.remove(&key);
            errors::auth_error_to_response(err)
        }
    }
}

/// POST /auth/signout - drop the session and its cookie.
pub async fn sign_out(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(key) = SessionKey::from_headers(&headers) {
        services.sessions.remove(&key);
    }
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, SessionKey::clear_cookie(services.secure_cookies))],
    )
        .into_response()
}

/// POST /auth/refresh - exchange the refresh token for a new pair.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let Some(key) = SessionKey::from_headers(&headers) else {
        return errors::auth_error_to_response(AuthError::Unauthenticated);
    };
    let Some(manager) = services.sessions.get(&key) else {
        return errors::auth_error_to_response(AuthError::Unauthenticated);
    };

    match manager.refresh(services.exchange.as_ref(), Utc::now()).await {
        Ok(session) => Json(dto::SessionSummary::new(
            &session,
            services.access.allowed_modules(&session.role),
        ))
        .into_response(),
        Err(err) => errors::auth_error_to_response(err),
    }
}

/// GET /auth/session - the current session, if it is still valid.
pub async fn current_session(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    let manager = SessionKey::from_headers(&headers).and_then(|key| services.sessions.get(&key));
    let Some(manager) = manager else {
        return errors::auth_error_to_response(AuthError::Unauthenticated);
    };

    match manager.current(Utc::now()) {
        Ok(session) => Json(dto::SessionSummary::new(
            &session,
            services.access.allowed_modules(&session.role),
        ))
        .into_response(),
        Err(err) => errors::auth_error_to_response(err),
    }
}
