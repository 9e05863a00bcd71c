use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use propdesk_auth::{Guard, GuardOutcome, SessionState};

use crate::app::errors;
use crate::context::{SessionContext, SessionKey};
use crate::store::SessionStore;

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const FORBIDDEN_PATH: &str = "/forbidden";

#[derive(Clone)]
pub struct GuardState {
    pub guard: Guard,
    pub sessions: SessionStore,
}

/// Route guard for every screen.
///
/// Resolves the request path to a module, checks it against the session's
/// role and either runs the handler (with [`SessionContext`] attached) or
/// redirects.
pub async fn guard_middleware(
    State(state): State<GuardState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let now = Utc::now();
    let (key, session_state) = observe(&state, &req, now);
    let outcome = state.guard.check_route(&session_state, req.uri().path(), now);
    respond(outcome, key, req, next).await
}

/// Session guard for endpoints that are not screens.
///
/// Needs a live session but skips the route table, so the unmapped-route
/// policy never applies to these paths.
pub async fn session_middleware(
    State(state): State<GuardState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let now = Utc::now();
    let (key, session_state) = observe(&state, &req, now);
    let outcome = state.guard.check_session(&session_state, now);
    respond(outcome, key, req, next).await
}

fn observe(
    state: &GuardState,
    req: &Request<Body>,
    now: DateTime<Utc>,
) -> (Option<SessionKey>, SessionState) {
    let key = SessionKey::from_headers(req.headers());
    let session_state = key
        .as_ref()
        .and_then(|key| state.sessions.get(key))
        .map(|manager| manager.observe(now))
        .unwrap_or(SessionState::Unauthenticated);
    (key, session_state)
}

async fn respond(
    outcome: GuardOutcome,
    key: Option<SessionKey>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!(path = req.uri().path(), outcome = outcome.name(), "route guard");

    match (outcome, key) {
        (GuardOutcome::Render(session), Some(key)) => {
            req.extensions_mut().insert(SessionContext::new(key, session));
            next.run(req).await
        }
        (GuardOutcome::Render(_), None) | (GuardOutcome::RedirectToSignIn, _) => {
            let callback = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| req.uri().path());
            redirect(&format!(
                "{SIGN_IN_PATH}?callbackUrl={}",
                urlencoding::encode(callback)
            ))
        }
        (GuardOutcome::Forbidden, _) => redirect(FORBIDDEN_PATH),
        (GuardOutcome::Loading, _) => {
            let mut resp = errors::json_error(
                StatusCode::CONFLICT,
                "sign_in_pending",
                "sign-in is still in progress",
            );
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            resp
        }
    }
}

fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response(),
        Err(_) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invalid_redirect",
            "could not build redirect location",
        ),
    }
}
