//! Credential exchange contract with the remote credentials API.
//!
//! The transport lives elsewhere (see `propdesk-api`); this module only
//! defines the wire shapes and the trait a transport implements.

use serde::{Deserialize, Serialize};

use propdesk_core::{OrganizationId, UserId};

use crate::{AuthError, OrganizationScope, Role, SessionUser, TokenPair};

/// Sign-in request body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `user` object of a successful sign-in response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeUser {
    pub id: UserId,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

/// Successful sign-in response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResponse {
    pub user: ExchangeUser,
    pub tokens: TokenPair,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
    #[serde(default)]
    pub organization_name: Option<String>,
}

impl ExchangeResponse {
    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.user.id.clone(),
            email: self.user.email.clone(),
            first_name: self.user.first_name.clone(),
            last_name: self.user.last_name.clone(),
        }
    }

    pub fn organization(&self) -> Option<OrganizationScope> {
        self.organization_id.as_ref().map(|id| OrganizationScope {
            id: id.clone(),
            name: self.organization_name.clone(),
        })
    }
}

/// Token refresh request body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Error payload returned by the credentials API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Transport for the credentials API.
///
/// Implementations map a rejection to [`AuthError::InvalidCredentials`]
/// (via [`AuthError::invalid_credentials`]) and network or decoding failures
/// to [`AuthError::Transport`]. They never retry.
#[async_trait::async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<ExchangeResponse, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
}
