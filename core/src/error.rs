//! Error types for request construction, transports and configuration.
//!
//! # Design
//! None of these escape `ResilientFetcher::fetch`: transport failures are
//! folded into an `Outcome`. They surface only where a caller builds a
//! request, resolves configuration, or drives a `Transport` directly.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while building an `HttpRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A failed attempt that never produced an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The attempt exceeded its wall-clock timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, reset, TLS failure, and so on.
    #[error("{0}")]
    Network(String),

    /// The request could not be sent as built (bad header value, unusable
    /// URI, redirect loop). Repeating it cannot help.
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Rejected(_))
    }
}

/// Errors raised while resolving `FetchConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
