use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, header};
use uuid::Uuid;

use propdesk_auth::Session;

pub const SESSION_COOKIE: &str = "propdesk_session";

/// Opaque key of a server-side session (the cookie value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the session cookie from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }

    /// `Set-Cookie` value binding this key to the client.
    pub fn cookie(&self, max_age_secs: i64, secure: bool) -> HeaderValue {
        cookie_header(&self.0, max_age_secs, secure)
    }

    /// `Set-Cookie` value removing the session cookie.
    pub fn clear_cookie(secure: bool) -> HeaderValue {
        cookie_header("", 0, secure)
    }
}

impl core::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn cookie_header(value: &str, max_age_secs: i64, secure: bool) -> HeaderValue {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    // Key is hex and the attributes are ASCII.
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("propdesk_session=; Max-Age=0"))
}

/// Session context for a guarded request.
///
/// Inserted by the guard middleware only when the guard decided to render.
#[derive(Debug, Clone)]
pub struct SessionContext {
    key: SessionKey,
    session: Arc<Session>,
}

impl SessionContext {
    pub fn new(key: SessionKey, session: Arc<Session>) -> Self {
        Self { key, session }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}
