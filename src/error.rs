//! Crate-wide error taxonomy.
//!
//! Every failure surfaced by the library is one of these variants; raw
//! transport or serialization errors never leak to callers.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by request dispatch, validation, transport and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed credentials, detected at adapter construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request failed a validation rule; no network call was made.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The model identifier names a prefix with no registered adapter.
    #[error("unknown provider prefix: {prefix}")]
    UnknownProvider { prefix: String },

    /// The backend rejected the request (HTTP 4xx).
    #[error("backend client error (HTTP {status}): {message}")]
    ClientApi { status: u16, message: String },

    /// The backend failed (HTTP 5xx).
    #[error("backend server error (HTTP {status}): {message}")]
    ServerApi { status: u16, message: String },

    /// Connect or read deadline exceeded.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// TLS negotiation or certificate verification failed.
    #[error("TLS failure: {0}")]
    Tls(String),

    /// Low-level connection failure.
    #[error("connection failure: {0}")]
    Network(String),

    /// Malformed streaming frame or unexpected JSON shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// A backend response not covered by any other variant.
    #[error("unexpected backend response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Whether a retry may help. Validation, configuration and 4xx failures
    /// are deterministic and never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ServerApi { .. } | Error::Timeout(_))
    }

    pub(crate) fn decode(context: &str, err: serde_json::Error) -> Self {
        Error::Decode(format!("{context}: {err}"))
    }

    /// Map a transport-level failure onto the taxonomy.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Error::Timeout(err.to_string());
        }
        if source_chain_mentions_tls(&err) {
            return Error::Tls(err.to_string());
        }
        if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
            return Error::Network(err.to_string());
        }
        Error::UnexpectedResponse(err.to_string())
    }

    /// Map a non-success HTTP status onto the taxonomy.
    pub(crate) fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        if status.is_client_error() {
            Error::ClientApi {
                status: status.as_u16(),
                message,
            }
        } else if status.is_server_error() {
            Error::ServerApi {
                status: status.as_u16(),
                message,
            }
        } else {
            Error::UnexpectedResponse(format!("HTTP {status}: {message}"))
        }
    }
}

fn source_chain_mentions_tls(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("tls") || text.contains("ssl") || text.contains("certificate") {
            return true;
        }
        source = cause.source();
    }
    false
}
