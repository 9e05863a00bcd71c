use thiserror::Error;

use crate::Role;

/// Message used when the credentials API rejects a sign-in without saying why.
pub const DEFAULT_INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Authentication / session failures.
///
/// Module denials are not errors; they are [`GuardOutcome`](crate::GuardOutcome)s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The credentials API rejected the exchange.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Credentials were valid but the role may not use this application.
    #[error("not authorized to access this application")]
    RoleNotAllowed { role: Role },

    /// An operation needs an organization but the session carries none.
    #[error("session has no organization scope")]
    MissingOrganizationScope,

    #[error("session has expired")]
    SessionExpired,

    #[error("not signed in")]
    Unauthenticated,

    /// The attempt was abandoned (sign-out or a newer attempt) before its
    /// response arrived; the response was discarded.
    #[error("authentication attempt was superseded")]
    Superseded,

    /// The credentials API could not be reached or answered nonsense.
    #[error("credentials service unavailable: {0}")]
    Transport(String),
}

impl AuthError {
    /// Rejection from the credentials API. The message is kept verbatim;
    /// a missing or blank one falls back to the default.
    pub fn invalid_credentials(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INVALID_CREDENTIALS.to_string());
        Self::InvalidCredentials(message)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Stable machine-readable code (used in HTTP error bodies).
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials(_) => "invalid_credentials",
            AuthError::RoleNotAllowed { .. } => "role_not_allowed",
            AuthError::MissingOrganizationScope => "missing_organization_scope",
            AuthError::SessionExpired => "session_expired",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Superseded => "superseded",
            AuthError::Transport(_) => "credentials_unavailable",
        }
    }
}
