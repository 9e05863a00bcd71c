//! Static access-control and session configuration.
//!
//! The role list, permission table and route map are a read-only artifact:
//! either the built-in property-management tables or a JSON document with
//! the same shape. They are validated once and turned into an
//! [`AccessEvaluator`].

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    AccessEvaluator, Module, PrefixMatch, Role, RoleRegistry, RouteTable, UnmappedRoutes,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("role '{0}' is allowed but has no permission entry")]
    RoleWithoutPermissions(String),

    #[error("route for module '{0}' has an empty path")]
    EmptyRoute(String),

    #[error("route '{0}' must start with '/'")]
    RelativeRoute(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("token lifetime ({token_secs}s) exceeds the session ceiling ({max_age_secs}s)")]
    TokenOutlivesSession { token_secs: i64, max_age_secs: i64 },

    #[error("failed to read access config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse access config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One role and the modules it may access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub role: Role,
    pub modules: Vec<Module>,
}

/// One route key and the module guarding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    pub module: Module,
}

/// Serializable access-control configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    /// Roles allowed to sign in. Defaults to every role in `permissions`.
    #[serde(default)]
    pub allowed_roles: Option<Vec<Role>>,
    pub permissions: Vec<RolePermissions>,
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub prefix_match: PrefixMatch,
    #[serde(default)]
    pub unmapped_routes: UnmappedRoutes,
}

impl AccessConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "loading access config");
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(allowed) = &self.allowed_roles {
            for role in allowed {
                if !self.permissions.iter().any(|p| &p.role == role) {
                    return Err(ConfigError::RoleWithoutPermissions(role.to_string()));
                }
            }
        }

        for entry in &self.routes {
            if entry.path.trim().is_empty() {
                return Err(ConfigError::EmptyRoute(entry.module.to_string()));
            }
            if !entry.path.starts_with('/') {
                return Err(ConfigError::RelativeRoute(entry.path.clone()));
            }
        }

        Ok(())
    }

    pub fn with_unmapped_routes(mut self, unmapped_routes: UnmappedRoutes) -> Self {
        self.unmapped_routes = unmapped_routes;
        self
    }

    pub fn registry(&self) -> RoleRegistry {
        let registry = RoleRegistry::new(
            self.permissions
                .iter()
                .map(|p| (p.role.clone(), p.modules.clone())),
        );

        match &self.allowed_roles {
            Some(allowed) => registry.with_allowed_roles(allowed.iter().cloned()),
            None => registry,
        }
    }

    pub fn route_table(&self) -> RouteTable {
        self.routes
            .iter()
            .fold(RouteTable::new(), |table, entry| {
                table.with_route(&entry.path, entry.module.clone())
            })
            .with_prefix_match(self.prefix_match)
    }

    pub fn evaluator(&self) -> AccessEvaluator {
        AccessEvaluator::new(self.registry(), self.route_table(), self.unmapped_routes)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        let registry = RoleRegistry::default();
        let routes = RouteTable::default();

        Self {
            allowed_roles: None,
            permissions: registry
                .roles()
                .map(|(role, modules)| RolePermissions {
                    role: role.clone(),
                    modules: modules.to_vec(),
                })
                .collect(),
            routes: routes
                .routes()
                .map(|(path, module)| RouteEntry {
                    path: path.to_string(),
                    module: module.clone(),
                })
                .collect(),
            prefix_match: routes.prefix_match(),
            unmapped_routes: UnmappedRoutes::default(),
        }
    }
}

/// Token and session lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Access token lifetime in seconds (`expiresIn`).
    pub token_lifetime_secs: i64,
    /// Hard ceiling for a session, refreshes included.
    pub max_age_secs: i64,
}

impl SessionConfig {
    pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 60 * 60;
    pub const DEFAULT_MAX_AGE_SECS: i64 = 24 * 60 * 60;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::ZeroDuration("token lifetime"));
        }
        if self.max_age_secs <= 0 {
            return Err(ConfigError::ZeroDuration("session max age"));
        }
        if self.token_lifetime_secs > self.max_age_secs {
            return Err(ConfigError::TokenOutlivesSession {
                token_secs: self.token_lifetime_secs,
                max_age_secs: self.max_age_secs,
            });
        }
        Ok(())
    }

    pub fn token_lifetime(&self) -> Duration {
        Duration::seconds(self.token_lifetime_secs)
    }

    pub fn max_age(&self) -> Duration {
        Duration::seconds(self.max_age_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: Self::DEFAULT_TOKEN_LIFETIME_SECS,
            max_age_secs: Self::DEFAULT_MAX_AGE_SECS,
        }
    }
}
