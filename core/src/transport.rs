//! The I/O seam between `ResilientFetcher` and the network.
//!
//! # Design
//! The fetcher only ever sees `HttpRequest` in and `HttpResponse` out, so
//! retry and classification logic is tested with scripted transports and no
//! sockets. `UreqTransport` is the blocking default.

use std::io;
use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one attempt of a request.
///
/// Any response that carries a status code, including 4xx and 5xx, is `Ok`.
/// `Err` is reserved for attempts that never got a status.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// Builds a fresh agent per attempt, so the connection lives exactly as long
/// as the attempt and the request's timeout bounds the whole exchange,
/// including reading the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout();
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();

        let url = request.full_url();
        let headers = request.headers();

        let result = match request.method() {
            HttpMethod::Get => headers
                .iter()
                .fold(agent.get(url.as_str()), |b, (k, v)| b.header(k.as_str(), v.as_str()))
                .call(),
            HttpMethod::Post => {
                let builder = headers
                    .iter()
                    .fold(agent.post(url.as_str()), |b, (k, v)| b.header(k.as_str(), v.as_str()));
                match request.body_string() {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| classify_error(e, timeout))?;
        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // The timeout bounds the download, not a size cap.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| classify_error(e, timeout))?;

        debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

fn classify_error(err: ureq::Error, timeout: Duration) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(timeout),
        ureq::Error::Io(ref e)
            if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) =>
        {
            TransportError::Timeout(timeout)
        }
        ureq::Error::Http(_)
        | ureq::Error::BadUri(_)
        | ureq::Error::RequireHttpsOnly(_)
        | ureq::Error::TooManyRedirects
        | ureq::Error::BodyExceedsLimit(_) => TransportError::Rejected(err.to_string()),
        other => TransportError::Network(other.to_string()),
    }
}
