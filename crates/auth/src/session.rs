//! Session snapshot produced by a successful credential exchange.
//!
//! A `Session` is immutable. Refreshing tokens produces a new snapshot that
//! replaces the old one wholesale; consumers re-read the latest snapshot
//! instead of mutating fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use propdesk_core::{OrganizationId, UserId};

use crate::{AuthError, Role, SessionConfig};

/// Authenticated identity as returned by the credentials API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl SessionUser {
    /// Display name (`"First Last"`, falling back to the email).
    pub fn name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// Organization the session acts within.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationScope {
    pub id: OrganizationId,
    pub name: Option<String>,
}

/// Access/refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionValidationError {
    #[error("session token has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

impl From<SessionValidationError> for AuthError {
    fn from(_: SessionValidationError) -> Self {
        AuthError::SessionExpired
    }
}

/// Immutable session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub role: Role,
    pub organization: Option<OrganizationScope>,
    #[serde(skip)]
    pub tokens: TokenPair,
    pub issued_at: DateTime<Utc>,
    /// Access token expiry (`issued_at + expiresIn`, never past `max_age_at`).
    pub expires_at: DateTime<Utc>,
    /// Hard ceiling for this session, refreshes included.
    pub max_age_at: DateTime<Utc>,
}

impl Session {
    /// Build a fresh snapshot at `now` using the configured lifetimes.
    pub fn issue(
        user: SessionUser,
        role: Role,
        organization: Option<OrganizationScope>,
        tokens: TokenPair,
        config: &SessionConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let max_age_at = now + config.max_age();
        Self {
            user,
            role,
            organization,
            tokens,
            issued_at: now,
            expires_at: (now + config.token_lifetime()).min(max_age_at),
            max_age_at,
        }
    }

    /// New snapshot with a refreshed token pair. Identity, role and
    /// organization carry over; the ceiling never moves.
    pub fn refreshed(&self, tokens: TokenPair, config: &SessionConfig, now: DateTime<Utc>) -> Self {
        Self {
            user: self.user.clone(),
            role: self.role.clone(),
            organization: self.organization.clone(),
            tokens,
            issued_at: now,
            expires_at: (now + config.token_lifetime()).min(self.max_age_at),
            max_age_at: self.max_age_at,
        }
    }

    /// Deterministically validate the snapshot's time window.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), SessionValidationError> {
        if self.expires_at <= self.issued_at {
            return Err(SessionValidationError::InvalidTimeWindow);
        }
        if now < self.issued_at {
            return Err(SessionValidationError::NotYetValid);
        }
        if now >= self.expires_at {
            return Err(SessionValidationError::Expired);
        }
        Ok(())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the session may still be refreshed.
    pub fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        now < self.max_age_at
    }

    /// Organization every data call must be scoped to.
    ///
    /// Missing scope is an integration error and fails loudly.
    pub fn require_organization(&self) -> Result<&OrganizationId, AuthError> {
        self.organization
            .as_ref()
            .map(|org| &org.id)
            .ok_or(AuthError::MissingOrganizationScope)
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.tokens.refresh_token
    }
}
