//! Blocking HTTP fetch with bounded retries and a closed outcome taxonomy.
//!
//! # Overview
//! `ResilientFetcher::fetch` sends one `HttpRequest` through a `Transport`,
//! retries transient failures a bounded number of times, and always returns
//! an `Outcome`. It never panics past its boundary and never returns `Err`.
//!
//! # Design
//! - The fetcher is stateless between calls; each call owns its attempts.
//! - The network sits behind `Transport` (`UreqTransport` by default), so
//!   retry and classification logic is testable without sockets.
//! - Logging goes through `tracing`; this crate never installs a subscriber.
//! - Credentials and retry settings are resolved once into `FetchConfig` and
//!   passed in; nothing here reads the environment implicitly.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod outcome;
pub mod transport;

pub use config::FetchConfig;
pub use error::{ConfigError, RequestError, TransportError};
pub use fetcher::{ResilientFetcher, Sleep, ThreadSleep};
pub use http::{HttpMethod, HttpRequest, HttpResponse, DEFAULT_TIMEOUT};
pub use outcome::Outcome;
pub use transport::{Transport, UreqTransport};
