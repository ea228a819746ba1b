//! Configuration for the Access API service.

use lectern_auth_core::{AuthConfig, CookieSettings, ReusePolicy, RosterLinkPolicy};
use std::str::FromStr;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

/// Access API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Access-control core configuration
    pub auth: AuthConfig,

    /// Request timeout
    pub request_timeout: Duration,

    /// Metrics enabled
    pub metrics_enabled: bool,

    /// Log output format
    pub log_format: LogFormat,

    /// How often expired rotation tokens are pruned
    pub prune_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let signing_secret =
            lookup("TOKEN_SIGNING_SECRET").ok_or(ConfigError::Missing("TOKEN_SIGNING_SECRET"))?;
        if signing_secret.len() < AuthConfig::MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid(
                "TOKEN_SIGNING_SECRET must be at least 32 characters",
            ));
        }
        let issuer = lookup("TOKEN_ISSUER").unwrap_or_else(|| "lectern".to_string());

        let http_port: u16 = parse(&lookup, "HTTP_PORT", 8080)?;
        let access_ttl_secs: u64 = parse(&lookup, "ACCESS_TOKEN_TTL_SECS", 15 * 60)?;
        let rotation_ttl_days: u64 = parse(&lookup, "ROTATION_TOKEN_TTL_DAYS", 7)?;
        let cookie_secure: bool = parse(&lookup, "COOKIE_SECURE", true)?;
        let reuse_grace_secs: u64 = parse(&lookup, "REUSE_GRACE_SECS", 0)?;
        let roster_auto_link: bool = parse(&lookup, "ROSTER_AUTO_LINK", true)?;
        let request_timeout_secs: u64 = parse(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let prune_interval_secs: u64 = parse(&lookup, "TOKEN_PRUNE_INTERVAL_SECS", 3600)?;
        let metrics_enabled: bool = parse(&lookup, "METRICS_ENABLED", true)?;

        if access_ttl_secs == 0 {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECS"));
        }
        if rotation_ttl_days == 0 {
            return Err(ConfigError::Invalid("ROTATION_TOKEN_TTL_DAYS"));
        }
        if prune_interval_secs == 0 {
            return Err(ConfigError::Invalid("TOKEN_PRUNE_INTERVAL_SECS"));
        }

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        let reuse_policy = if reuse_grace_secs == 0 {
            ReusePolicy::RevokeAll
        } else {
            ReusePolicy::GraceWindow(Duration::from_secs(reuse_grace_secs))
        };
        let roster_link_policy = if roster_auto_link {
            RosterLinkPolicy::EmailMatch
        } else {
            RosterLinkPolicy::RequireCode
        };

        let auth = AuthConfig::try_new(signing_secret, issuer)
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?
            .with_access_token_ttl(Duration::from_secs(access_ttl_secs))
            .with_rotation_token_ttl(Duration::from_secs(rotation_ttl_days * 24 * 3600))
            .with_cookies(CookieSettings {
                secure: cookie_secure,
                ..CookieSettings::default()
            })
            .with_reuse_policy(reuse_policy)
            .with_roster_link_policy(roster_link_policy);

        Ok(Self {
            http_port,
            database_url,
            auth,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            log_format,
            prune_interval: Duration::from_secs(prune_interval_secs),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
