//! HTTP request and response types described as plain data.
//!
//! # Design
//! `HttpRequest` is immutable once built: construction validates the URL, and
//! the `with_*` methods consume and return the request so nothing can change
//! it after it is handed to a fetcher. `HttpResponse` is whatever a transport
//! observed for one attempt; the body stays as raw bytes so classification
//! decides whether it is JSON.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::RequestError;

/// Per-attempt timeout applied when the caller does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated HTTP request.
///
/// Query parameters are kept apart from the base URL and only merged by
/// [`HttpRequest::full_url`], so they are percent-encoded exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    method: HttpMethod,
    url: Url,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    timeout: Duration,
}

impl HttpRequest {
    /// Build a request, rejecting URLs that do not parse or are not http(s).
    pub fn new(method: HttpMethod, url: &str) -> Result<Self, RequestError> {
        let parsed = Url::parse(url).map_err(|e| RequestError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RequestError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }
        Ok(Self {
            method,
            url: parsed,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn get(url: &str) -> Result<Self, RequestError> {
        Self::new(HttpMethod::Get, url)
    }

    /// A POST carrying `body` as JSON.
    pub fn post(url: &str, body: Value) -> Result<Self, RequestError> {
        Ok(Self::new(HttpMethod::Post, url)?.with_json(body))
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_bearer_auth(self, token: &str) -> Self {
        self.with_header("authorization", format!("Bearer {token}"))
    }

    /// Attach a JSON body. Adds `content-type: application/json` unless a
    /// content type is already present.
    pub fn with_json(mut self, body: Value) -> Self {
        if self.header("content-type").is_none() {
            self.headers
                .push(("content-type".to_string(), "application/json".to_string()));
        }
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The base URL as given, without the query parameters added through
    /// [`HttpRequest::with_query`].
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The body serialized as compact JSON, ready for the wire.
    pub fn body_string(&self) -> Option<String> {
        self.body.as_ref().map(Value::to_string)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The URL actually sent: base URL plus encoded query parameters.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }
}

/// An HTTP response as observed by one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True when the body is absent or only whitespace.
    pub fn is_body_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
