//! Service configuration, read from the environment.
//!
//! | Variable                        | Default                  |
//! |---------------------------------|--------------------------|
//! | `PROPDESK_BIND_ADDR`            | `0.0.0.0:8080`           |
//! | `PROPDESK_AUTH_API_URL`         | `http://localhost:3000`  |
//! | `PROPDESK_TOKEN_TTL_SECS`       | `3600`                   |
//! | `PROPDESK_SESSION_MAX_AGE_SECS` | `86400`                  |
//! | `PROPDESK_UNMAPPED_ROUTES`      | `allow`                  |
//! | `PROPDESK_ACCESS_CONFIG`        | built-in tables          |
//! | `PROPDESK_SECURE_COOKIES`       | `false`                  |
//! | `PROPDESK_HTTP_TIMEOUT_SECS`    | `10`                     |

use std::net::SocketAddr;

use thiserror::Error;

use propdesk_auth::{AccessConfig, ConfigError, SessionConfig, UnmappedRoutes};

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Access(#[from] ConfigError),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Base URL of the remote credentials API (no trailing slash).
    pub auth_api_url: String,
    pub http_timeout_secs: u64,
    pub session: SessionConfig,
    pub access: AccessConfig,
    pub secure_cookies: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = parse_var(&lookup, "PROPDESK_BIND_ADDR", defaults.bind_addr)?;
        let auth_api_url = lookup("PROPDESK_AUTH_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.auth_api_url);
        let http_timeout_secs =
            parse_var(&lookup, "PROPDESK_HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?;

        let session = SessionConfig {
            token_lifetime_secs: parse_var(
                &lookup,
                "PROPDESK_TOKEN_TTL_SECS",
                defaults.session.token_lifetime_secs,
            )?,
            max_age_secs: parse_var(
                &lookup,
                "PROPDESK_SESSION_MAX_AGE_SECS",
                defaults.session.max_age_secs,
            )?,
        };
        session.validate()?;

        let mut access = match lookup("PROPDESK_ACCESS_CONFIG") {
            Some(path) => AccessConfig::load(path)?,
            None => defaults.access,
        };
        if let Some(value) = lookup("PROPDESK_UNMAPPED_ROUTES") {
            access = access.with_unmapped_routes(parse_unmapped(&value)?);
        }

        let secure_cookies = parse_var(&lookup, "PROPDESK_SECURE_COOKIES", defaults.secure_cookies)?;

        Ok(Self {
            bind_addr,
            auth_api_url,
            http_timeout_secs,
            session,
            access,
            secure_cookies,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            auth_api_url: "http://localhost:3000".to_string(),
            http_timeout_secs: 10,
            session: SessionConfig::default(),
            access: AccessConfig::default(),
            secure_cookies: false,
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: core::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigLoadError::Invalid {
                name,
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}

fn parse_unmapped(value: &str) -> Result<UnmappedRoutes, ConfigLoadError> {
    match value.trim().to_lowercase().as_str() {
        "allow" | "open" => Ok(UnmappedRoutes::Allow),
        "deny" | "closed" => Ok(UnmappedRoutes::Deny),
        _ => Err(ConfigLoadError::Invalid {
            name: "PROPDESK_UNMAPPED_ROUTES",
            value: value.to_string(),
            reason: "expected 'allow' or 'deny'".to_string(),
        }),
    }
}
