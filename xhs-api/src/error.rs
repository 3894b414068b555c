//! Error types for the Xiaohongshu API client.

use crate::transport::TransportError;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Envelope codes the server returns for transient failures on its side.
pub(crate) const TRANSIENT_API_CODES: [i64; 3] = [500, 502, 503];

/// Errors that can occur when interacting with the Xiaohongshu API.
///
/// Every variant maps to one retry class, see [`XhsError::is_retryable`].
#[derive(Debug, Error)]
pub enum XhsError {
    /// The client is misconfigured: empty cookie, no signature provider,
    /// signing script or JavaScript runtime not found, HTTP client build failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller supplied invalid parameters. No request was sent.
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// The cookie was rejected (envelope code `10001` / `10002`).
    ///
    /// The session must be refreshed from a logged-in browser.
    #[error("authentication failed (code {code}): {message}")]
    Auth {
        /// Envelope status code.
        code: i64,
        /// Message from the envelope.
        message: String,
    },

    /// Too many requests (envelope code `10003`).
    #[error("rate limit exceeded: {message}")]
    RateLimited {
        /// Message from the envelope.
        message: String,
        /// Advised wait before the next attempt.
        retry_after: Duration,
    },

    /// The API returned an unsuccessful envelope.
    ///
    /// Only codes `500`, `502` and `503` are treated as transient.
    #[error("API error (code {code}): {message}")]
    Api {
        /// Envelope status code (not the HTTP status).
        code: i64,
        /// Human-readable error message from the API.
        message: String,
        /// The raw envelope, kept for diagnostics.
        response: Box<Value>,
    },

    /// HTTP status 5xx.
    #[error("server error: HTTP {status}")]
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// Transport failure (connection refused, timeout, TLS, body read).
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// The signature provider failed or produced unusable output.
    #[error("signature generation failed: {0}")]
    Signature(String),

    /// The response body is not a JSON object.
    #[error("malformed response (HTTP {status}): {body}")]
    MalformedResponse {
        /// HTTP status code.
        status: u16,
        /// Start of the offending body.
        body: String,
    },

    /// File I/O error (session file read/write, script runner pipes).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error outside of response parsing.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XhsError {
    /// Whether a failed attempt with this error may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Server { .. } | Self::RateLimited { .. } => true,
            Self::Api { code, .. } => TRANSIENT_API_CODES.contains(code),
            _ => false,
        }
    }
}

/// Convenience alias for `Result<T, XhsError>`.
pub type Result<T> = std::result::Result<T, XhsError>;
