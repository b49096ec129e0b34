//! Fetch settings resolved once at process start.
//!
//! # Design
//! The fetcher never reads the environment. A caller resolves `FetchConfig`
//! up front (normally with [`FetchConfig::from_env`]) and passes the pieces it
//! needs explicitly. A missing `API_KEY` is not an error: the caller decides
//! whether an unauthenticated request is worth sending.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::http::HttpRequest;

pub const API_KEY_VAR: &str = "API_KEY";
pub const TIMEOUT_VAR: &str = "FETCH_TIMEOUT_MS";
pub const MAX_ATTEMPTS_VAR: &str = "FETCH_MAX_ATTEMPTS";
pub const BACKOFF_VAR: &str = "FETCH_BACKOFF_MS";

#[derive(Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve settings from any key/value source. Unset variables fall back
    /// to [`FetchConfig::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => Duration::from_millis(parse_u64(TIMEOUT_VAR, &raw, 1)?),
            None => defaults.timeout,
        };
        let max_attempts = match lookup(MAX_ATTEMPTS_VAR) {
            Some(raw) => u32::try_from(parse_u64(MAX_ATTEMPTS_VAR, &raw, 1)?).map_err(|_| {
                ConfigError::Invalid {
                    var: MAX_ATTEMPTS_VAR,
                    value: raw.clone(),
                    reason: "too large".to_string(),
                }
            })?,
            None => defaults.max_attempts,
        };
        let backoff = match lookup(BACKOFF_VAR) {
            Some(raw) => Duration::from_millis(parse_u64(BACKOFF_VAR, &raw, 0)?),
            None => defaults.backoff,
        };
        Ok(Self {
            api_key,
            timeout,
            max_attempts,
            backoff,
        })
    }

    /// Set the per-attempt timeout and, when an API key is configured and
    /// the request has no `authorization` header yet, bearer auth.
    pub fn apply(&self, request: HttpRequest) -> HttpRequest {
        let request = request.with_timeout(self.timeout);
        match &self.api_key {
            Some(key) if request.header("authorization").is_none() => request.with_bearer_auth(key),
            _ => request,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}

fn parse_u64(var: &'static str, raw: &str, min: u64) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason,
    };
    let value: u64 = raw.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    if value < min {
        return Err(invalid(format!("must be at least {min}")));
    }
    Ok(value)
}
