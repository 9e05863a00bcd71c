//! `propdesk-auth`: access-control and session boundary.
//!
//! Role registry, route resolution, access decisions, the session snapshot and
//! its lifecycle. This crate is intentionally decoupled from HTTP and storage:
//! the credentials API is reached through the [`CredentialExchange`] trait.

pub mod access;
pub mod config;
pub mod error;
pub mod exchange;
pub mod guard;
pub mod manager;
pub mod modules;
pub mod registry;
pub mod roles;
pub mod routes;
pub mod session;

pub use access::{AccessEvaluator, AccessExplanation, DecisionReason, UnmappedRoutes};
pub use config::{AccessConfig, ConfigError, RolePermissions, RouteEntry, SessionConfig};
pub use error::{AuthError, DEFAULT_INVALID_CREDENTIALS};
pub use exchange::{
    CredentialExchange, Credentials, ExchangeErrorBody, ExchangeResponse, ExchangeUser,
    RefreshRequest,
};
pub use guard::{Guard, GuardOutcome};
pub use manager::{SessionManager, SessionState};
pub use modules::Module;
pub use registry::RoleRegistry;
pub use roles::Role;
pub use routes::{normalize_path, PrefixMatch, RouteMatch, RouteResolution, RouteTable};
pub use session::{OrganizationScope, Session, SessionUser, SessionValidationError, TokenPair};
