//! Bounded-retry fetch on top of a `Transport`.
//!
//! # Design
//! `ResilientFetcher` holds a transport and a sleeper and nothing else; each
//! `fetch` call is independent. The loop retries only transient outcomes
//! (timeouts, connection errors, 5xx) and waits a fixed `backoff` between
//! attempts. Every attempt emits exactly one `tracing` event inside a `fetch`
//! span, so whichever subscriber the caller has installed is the log sink.

use std::time::Duration;

use tracing::{info, info_span, warn};

use crate::config::FetchConfig;
use crate::http::HttpRequest;
use crate::outcome::Outcome;
use crate::transport::{Transport, UreqTransport};

/// Blocks the current thread between attempts.
pub trait Sleep {
    fn sleep(&self, duration: Duration);
}

/// `std::thread::sleep`, skipped for zero durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResilientFetcher<T = UreqTransport, S = ThreadSleep> {
    transport: T,
    sleeper: S,
}

impl ResilientFetcher {
    /// A fetcher using `ureq` and real sleeps.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport> ResilientFetcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            sleeper: ThreadSleep,
        }
    }
}

impl<T: Transport, S: Sleep> ResilientFetcher<T, S> {
    pub fn with_sleeper<S2: Sleep>(self, sleeper: S2) -> ResilientFetcher<T, S2> {
        ResilientFetcher {
            transport: self.transport,
            sleeper,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform `request`, retrying transient failures.
    ///
    /// `max_attempts` counts attempts, not retries; 0 behaves like 1. When
    /// every attempt fails transiently the result is
    /// `Outcome::NetworkError` carrying the last failure message.
    pub fn fetch(&self, request: &HttpRequest, max_attempts: u32, backoff: Duration) -> Outcome {
        let max_attempts = max_attempts.max(1);
        let url = request.full_url();
        let span = info_span!("fetch", method = %request.method(), url = %url);
        let _enter = span.enter();

        let mut last_failure = String::new();
        for attempt in 1..=max_attempts {
            let (outcome, retryable, transport_failure) = match self.transport.execute(request) {
                Ok(response) => {
                    let outcome = Outcome::from_response(request.method(), &response);
                    let retryable = outcome.is_retryable();
                    (outcome, retryable, None)
                }
                Err(err) => {
                    let retryable = err.is_retryable();
                    let message = err.to_string();
                    (Outcome::from(err), retryable, Some(message))
                }
            };

            if !retryable {
                info!(
                    attempt,
                    max_attempts,
                    method = %request.method(),
                    url = %url,
                    outcome = outcome.kind(),
                    status = outcome.status(),
                    "fetch attempt finished"
                );
                return outcome;
            }

            last_failure = transport_failure.unwrap_or_else(|| outcome.to_string());
            warn!(
                attempt,
                max_attempts,
                method = %request.method(),
                url = %url,
                outcome = outcome.kind(),
                error = %last_failure,
                "fetch attempt failed"
            );
            if attempt < max_attempts {
                self.sleeper.sleep(backoff);
            }
        }

        Outcome::NetworkError(last_failure)
    }

    /// [`fetch`](Self::fetch) with attempts and backoff taken from `config`,
    /// after [`FetchConfig::apply`] has set the timeout and credential.
    pub fn fetch_with_config(&self, request: &HttpRequest, config: &FetchConfig) -> Outcome {
        let request = config.apply(request.clone());
        self.fetch(&request, config.max_attempts, config.backoff)
    }
}
