//! Transport abstraction.
//!
//! The request pipeline builds a fully resolved [`HttpRequest`] (URL with
//! query string, headers, serialized body) and hands it to a transport.
//! [`Transport`] is the blocking seam, [`AsyncTransport`] the async one.
//! Production code uses reqwest ([`ReqwestTransport`],
//! [`AsyncReqwestTransport`]); tests use [`MockTransport`].

mod http;
mod mock;

pub use http::{AsyncReqwestTransport, ReqwestTransport};
pub use mock::MockTransport;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Transport-level failures. All of them are retryable.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Could not connect (DNS, refused, TLS handshake).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The call exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Any other failure while sending or reading the response.
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// HTTP method. The API only uses these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved request, ready to send.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Endpoint path, e.g. `/api/sns/web/v1/feed`.
    pub path: String,
    /// Full URL including the encoded query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Compact JSON body for POST requests.
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value with this (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("cookie") {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Raw response: status and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response carrying `json`.
    pub fn json(json: &serde_json::Value) -> Self {
        Self::new(200, json.to_string())
    }
}

/// Blocking transport.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Async transport. Must tolerate concurrent in-flight calls.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_cookie_header() {
        let req = HttpRequest {
            method: Method::Get,
            path: "/p".into(),
            url: "https://h/p".into(),
            headers: vec![
                ("cookie".into(), "web_session=secret".into()),
                ("x-t".into(), "1".into()),
            ],
            body: None,
        };
        let dbg = format!("{req:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("x-t"));
        assert_eq!(req.header("COOKIE"), Some("web_session=secret"));
    }
}
