//! Classification of a single attempt into an `Outcome`.
//!
//! # Design
//! Status codes split into definitive answers (2xx, 4xx) and transient
//! failures (5xx, timeouts, connection errors). Only the latter are retried
//! by `ResilientFetcher`; a 404 or 401 will not change on a second try.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpResponse};

/// Result of a fetch. Every failure path resolves to one of these variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum Outcome {
    /// 2xx with a well-formed JSON body (`null` for an empty POST ack).
    Success(Value),
    NotFound,
    /// 401 or 403.
    Unauthorized,
    ClientError(u16),
    ServerError(u16),
    Timeout,
    NetworkError(String),
    MalformedBody(String),
}

impl Outcome {
    /// Classify a response that arrived with a status code.
    pub fn from_response(method: HttpMethod, response: &HttpResponse) -> Self {
        match response.status {
            200..=299 => parse_body(method, response),
            404 => Outcome::NotFound,
            401 | 403 => Outcome::Unauthorized,
            500..=599 => Outcome::ServerError(response.status),
            // Unfollowed 3xx and anything odd below 400 is treated like a
            // definitive client-side answer.
            status => Outcome::ClientError(status),
        }
    }

    /// Short machine-friendly name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::NotFound => "not_found",
            Outcome::Unauthorized => "unauthorized",
            Outcome::ClientError(_) => "client_error",
            Outcome::ServerError(_) => "server_error",
            Outcome::Timeout => "timeout",
            Outcome::NetworkError(_) => "network_error",
            Outcome::MalformedBody(_) => "malformed_body",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Transient failures that may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Outcome::ServerError(_) | Outcome::Timeout | Outcome::NetworkError(_)
        )
    }

    /// The HTTP status behind this outcome, when one is implied.
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::NotFound => Some(404),
            Outcome::ClientError(code) | Outcome::ServerError(code) => Some(*code),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }
}

impl From<TransportError> for Outcome {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => Outcome::Timeout,
            err @ TransportError::Rejected(_) => Outcome::NetworkError(err.to_string()),
            TransportError::Network(msg) => Outcome::NetworkError(msg),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(value) => write!(f, "success: {value}"),
            Outcome::NotFound => write!(f, "HTTP 404 not found"),
            Outcome::Unauthorized => write!(f, "unauthorized"),
            Outcome::ClientError(code) => write!(f, "HTTP {code} client error"),
            Outcome::ServerError(code) => write!(f, "HTTP {code} server error"),
            Outcome::Timeout => write!(f, "request timed out"),
            Outcome::NetworkError(msg) => write!(f, "network error: {msg}"),
            Outcome::MalformedBody(msg) => write!(f, "malformed response body: {msg}"),
        }
    }
}

fn parse_body(method: HttpMethod, response: &HttpResponse) -> Outcome {
    if method == HttpMethod::Post && response.is_body_empty() {
        return Outcome::Success(Value::Null);
    }
    match serde_json::from_slice(&response.body) {
        Ok(value) => Outcome::Success(value),
        Err(e) => Outcome::MalformedBody(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn get(status: u16, body: &str) -> Outcome {
        Outcome::from_response(HttpMethod::Get, &HttpResponse::new(status, body))
    }

    #[test]
    fn ok_with_json_is_success() {
        assert_eq!(get(200, r#"{"id":5,"title":"x"}"#), Outcome::Success(json!({"id": 5, "title": "x"})));
    }

    #[test]
    fn created_with_json_is_success() {
        let outcome = Outcome::from_response(HttpMethod::Post, &HttpResponse::new(201, r#"{"id":101}"#));
        assert_eq!(outcome, Outcome::Success(json!({"id": 101})));
    }

    #[test]
    fn ok_with_garbage_is_malformed() {
        let outcome = get(200, "<html>oops</html>");
        assert!(matches!(outcome, Outcome::MalformedBody(_)));
        assert!(!outcome.is_retryable());
    }

    #[test]
    fn empty_post_ack_is_success_null() {
        let outcome = Outcome::from_response(HttpMethod::Post, &HttpResponse::new(204, ""));
        assert_eq!(outcome, Outcome::Success(Value::Null));
    }

    #[test]
    fn empty_get_body_is_malformed() {
        assert!(matches!(get(200, ""), Outcome::MalformedBody(_)));
    }

    #[test]
    fn status_codes_map_to_variants() {
        assert_eq!(get(404, "{}"), Outcome::NotFound);
        assert_eq!(get(401, ""), Outcome::Unauthorized);
        assert_eq!(get(403, ""), Outcome::Unauthorized);
        assert_eq!(get(400, ""), Outcome::ClientError(400));
        assert_eq!(get(429, ""), Outcome::ClientError(429));
        assert_eq!(get(302, ""), Outcome::ClientError(302));
        assert_eq!(get(500, ""), Outcome::ServerError(500));
        assert_eq!(get(503, ""), Outcome::ServerError(503));
    }

    #[test]
    fn only_transient_outcomes_are_retryable() {
        assert!(Outcome::ServerError(502).is_retryable());
        assert!(Outcome::Timeout.is_retryable());
        assert!(Outcome::NetworkError("refused".into()).is_retryable());
        assert!(!Outcome::NotFound.is_retryable());
        assert!(!Outcome::Unauthorized.is_retryable());
        assert!(!Outcome::ClientError(422).is_retryable());
        assert!(!Outcome::Success(Value::Null).is_retryable());
    }

    #[test]
    fn transport_errors_convert() {
        assert_eq!(Outcome::from(TransportError::Timeout(Duration::from_secs(1))), Outcome::Timeout);
        assert_eq!(
            Outcome::from(TransportError::Network("connection refused".into())),
            Outcome::NetworkError("connection refused".into())
        );
    }

    #[test]
    fn serializes_with_kind_tag() {
        let value = serde_json::to_value(Outcome::ServerError(503)).unwrap();
        assert_eq!(value, json!({"kind": "ServerError", "detail": 503}));
        let value = serde_json::to_value(Outcome::NotFound).unwrap();
        assert_eq!(value, json!({"kind": "NotFound"}));
    }

    #[test]
    fn into_value_only_for_success() {
        assert_eq!(Outcome::Success(json!([1])).into_value(), Some(json!([1])));
        assert_eq!(Outcome::Timeout.into_value(), None);
    }
}
