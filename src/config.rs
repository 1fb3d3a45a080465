//! Process configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

use crate::secret::Secret;

/// Environment key holding the token signing secret.
pub const SECRET_KEY_VAR: &str = "JWT_SECRET_KEY";
/// Environment key for token lifetime in seconds.
pub const TOKEN_TTL_VAR: &str = "TOKEN_TTL_SECS";
/// Environment key for the default `sales` page size.
pub const PAGE_LIMIT_VAR: &str = "DEFAULT_PAGE_LIMIT";

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_PAGE_LIMIT: usize = 20;

/// Problems reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required setting {0}")]
    Missing(&'static str),
    /// A variable is set but unparsable.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Settings shared by the resolver and the operation handlers.
#[derive(Debug)]
pub struct Config {
    /// HMAC key for bearer tokens
    pub token_secret: Secret<String>,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Page size used when `sales` is called without a limit
    pub default_page_limit: usize,
}

impl Config {
    /// Configuration with the given secret and default limits.
    pub fn new(token_secret: impl Into<Secret<String>>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            default_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use marketplace_core::Config;
    ///
    /// let vars = HashMap::from([("JWT_SECRET_KEY", "k3y"), ("DEFAULT_PAGE_LIMIT", "5")]);
    /// let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    /// assert_eq!(config.default_page_limit, 5);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let secret = lookup(SECRET_KEY_VAR)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing(SECRET_KEY_VAR))?;

        let mut config = Config::new(secret);
        if let Some(ttl) = parse_var::<u64, _>(&lookup, TOKEN_TTL_VAR)? {
            config.token_ttl = Duration::from_secs(ttl);
        }
        if let Some(limit) = parse_var::<usize, _>(&lookup, PAGE_LIMIT_VAR)? {
            config.default_page_limit = limit;
        }
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
