//! Environment-driven configuration shared by the client library and the CLI.

use std::{env, time::Duration};

use thiserror::Error;

/// Base URL of the hosted listing-bot service.
pub const DEFAULT_BASE_URL: &str = "https://v2.noemt.dev";

/// Mojang profile lookup used to check that a username exists.
pub const DEFAULT_PROFILE_LOOKUP_URL: &str = "https://mowojang.matdoes.dev";

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_USER_CACHE_TTL_SECS: u64 = 300;

/// Connection settings for the remote REST service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    profile_lookup_url: String,
    session_cookie: Option<String>,
    request_timeout: Duration,
    user_cache_ttl: Duration,
}

impl ClientConfig {
    /// Loads configuration by hydrating `.env` (if present) and reading the
    /// `LISTING_DASH_*` process variables. Every variable is optional; only
    /// malformed numbers surface as `ConfigError`.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let base_url = get_optional_var("LISTING_DASH_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let profile_lookup_url = get_optional_var("LISTING_DASH_PROFILE_LOOKUP_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_PROFILE_LOOKUP_URL.to_string());
        let session_cookie = get_optional_var("LISTING_DASH_SESSION_COOKIE");
        let request_timeout = Duration::from_secs(get_seconds_var(
            "LISTING_DASH_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let user_cache_ttl = Duration::from_secs(get_seconds_var(
            "LISTING_DASH_USER_CACHE_TTL_SECS",
            DEFAULT_USER_CACHE_TTL_SECS,
        )?);

        Ok(Self {
            base_url,
            profile_lookup_url,
            session_cookie,
            request_timeout,
            user_cache_ttl,
        })
    }

    /// Builds a config pointing at `base_url` with defaults for everything
    /// else. Used by tests and embedders that do not read the environment.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            profile_lookup_url: DEFAULT_PROFILE_LOOKUP_URL.to_string(),
            session_cookie: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_cache_ttl: Duration::from_secs(DEFAULT_USER_CACHE_TTL_SECS),
        }
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_profile_lookup_url(mut self, url: impl Into<String>) -> Self {
        self.profile_lookup_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn profile_lookup_url(&self) -> &str {
        &self.profile_lookup_url
    }

    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn user_cache_ttl(&self) -> Duration {
        self.user_cache_ttl
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn get_seconds_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match get_optional_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|source| ConfigError::InvalidNumber { key, source }),
        None => Ok(default),
    }
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("LISTING_DASH_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
