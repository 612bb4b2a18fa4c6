//! Wire request/response value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::query::CanonicalUri;

/// HTTP method for a wire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Get the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown HTTP method.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct ParseHttpMethodError(String);

impl FromStr for HttpMethod {
    type Err = ParseHttpMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(ParseHttpMethodError(s.to_string())),
        }
    }
}

/// Case-insensitive, order-preserving header collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first value for a header name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing any existing values for the name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.entries.push((name, value.into()));
    }

    /// Append a header without replacing existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// A wire request value: method, target URI, headers, optional body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: CanonicalUri,
    pub headers: Headers,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Create a bodiless request.
    #[must_use]
    pub fn new(method: HttpMethod, uri: CanonicalUri) -> Self {
        Self {
            method,
            uri,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A wire response value: status code, headers, optional body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Option<String>,
}

impl HttpResponse {
    /// Create a response with the given status and no body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 5xx status. Retried under the default backoff strategy.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// HTTP 429. Retried under the throttling backoff strategy.
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        self.status == 429
    }

    /// 4xx status other than throttling.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status) && !self.is_throttled()
    }

    /// Whether the body is absent or blank.
    #[must_use]
    pub fn has_empty_body(&self) -> bool {
        self.body.as_deref().map_or(true, |b| b.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
        ] {
            assert_eq!(method.as_str().parse::<HttpMethod>().unwrap(), method);
        }
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json");
        assert_eq!(headers.get("content-type"), Some("application/json"));
        headers.set("CONTENT-TYPE", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.iter().count(), 1);
    }

    #[test]
    fn test_response_classification() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(503).is_server_error());
        assert!(HttpResponse::new(429).is_throttled());
        assert!(!HttpResponse::new(429).is_client_error());
        assert!(HttpResponse::new(404).is_client_error());
    }

    #[test]
    fn test_empty_body_detection() {
        assert!(HttpResponse::new(202).has_empty_body());
        assert!(HttpResponse::new(202).with_body("  ").has_empty_body());
        assert!(!HttpResponse::new(200).with_body("{}").has_empty_body());
    }
}
