use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use propdesk_auth::{Module, Role, Session};
use propdesk_core::{OrganizationId, UserId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInQuery {
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub path: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

/// Client-visible view of a session. Tokens stay server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub user: UserSummary,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
    pub organization_name: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub modules: Vec<Module>,
}

impl SessionSummary {
    pub fn new(session: &Session, modules: &[Module]) -> Self {
        Self {
            user: UserSummary {
                id: session.user.id.clone(),
                email: session.user.email.clone(),
                name: session.user.name(),
            },
            role: session.role.clone(),
            organization_id: session.organization.as_ref().map(|o| o.id.clone()),
            organization_name: session.organization.as_ref().and_then(|o| o.name.clone()),
            expires_at: session.expires_at,
            modules: modules.to_vec(),
        }
    }
}

/// What a screen may render for the current session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenContext {
    pub path: String,
    pub module: Module,
    pub user: UserSummary,
    pub role: Role,
    pub organization_id: OrganizationId,
}
