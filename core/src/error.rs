//! Error types for the Ohmyfin API client.
//!
//! # Design
//! Four failure classes stay distinct so callers can decide what is worth
//! retrying: bad client configuration, missing request fields caught before
//! any I/O, transport faults carrying their original cause, and errors
//! reported by (or inferred from) the remote API. A timeout is an `ApiError`
//! with status 408 rather than its own variant.

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by `OhmyfinClient`.
#[derive(Debug, Error)]
pub enum Error {
    /// The client configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Required request fields were missing; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request never produced an HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The API answered with an error, an unparseable body, or not in time.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl Error {
    /// The API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Structured failure surfaced from an API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API error {status_code}: {message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: u16,
    /// Field-level messages, when the API reported them as an object.
    /// Only entries holding a list of strings are kept.
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub const TIMEOUT_STATUS: u16 = 408;

    pub fn new(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code,
            errors: None,
        }
    }

    pub(crate) fn timeout() -> Self {
        Self::new("Request timeout", Self::TIMEOUT_STATUS)
    }

    pub(crate) fn invalid_json(status_code: u16) -> Self {
        Self::new("Invalid JSON response", status_code)
    }

    pub fn is_timeout(&self) -> bool {
        self.status_code == Self::TIMEOUT_STATUS
    }
}

/// Required fields were absent from an operation's input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation}: missing required field(s): {}", .missing.join(", "))]
pub struct ValidationError {
    pub operation: &'static str,
    pub missing: Vec<&'static str>,
}

/// A connection-level failure, wrapping whatever the transport reported.
#[derive(Debug, Error)]
#[error("transport error: {source}")]
pub struct TransportError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransportError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The underlying cause, e.g. for `downcast_ref::<reqwest::Error>()`.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.source
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}
