//! Error types for talking to the document API and projecting its results.
//!
//! Every fallible library operation returns [`Result<T>`]. The variants map
//! one-to-one onto the failure classes the HTTP layer distinguishes:
//!
//! | Variant | Cause | HTTP status |
//! |---------|-------|-------------|
//! | [`Error::Transport`] | connection, TLS, or timeout failure | 500 |
//! | [`Error::Remote`] | upstream answered with a non-2xx status | 500 |
//! | [`Error::Decode`] | upstream body is not the expected envelope | 500 |
//! | [`Error::NotFound`] | requested test case is not in the result set | 404 |
//! | [`Error::NotATable`] | block exists but is not a table | 400 |
//! | [`Error::InvalidId`] | block id is not a plain id | 400 |
//! | [`Error::InvalidUrl`] | configured API URL cannot be used as a base | 500 |
//!
//! Nothing here is retried. Property extraction never produces an error at
//! all; missing or malformed properties degrade to empty values instead.

use axum::http::StatusCode;
use thiserror::Error;

/// Failure raised by the remote client, the table reconstructor, or the
/// test-case aggregator.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream API returned a non-success status.
    ///
    /// The raw response body is kept so callers can surface the upstream
    /// explanation verbatim.
    #[error("notion API error: status {status}, body: {body}")]
    Remote {
        /// HTTP status code returned by the upstream API.
        status: u16,
        /// Response body as text (may be empty).
        body: String,
    },

    /// The response body could not be decoded into the expected envelope.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A lookup by key found nothing.
    #[error("{0} not found")]
    NotFound(String),

    /// A table operation was asked to read a block that is not a table.
    #[error("block {0} is not a table")]
    NotATable(String),

    /// A block id contains characters other than ASCII letters, digits, or `-`.
    #[error("invalid block id '{0}'")]
    InvalidId(String),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// HTTP status the inbound API responds with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotATable(_) | Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Transport(_) | Self::Remote { .. } | Self::Decode(_) | Self::InvalidUrl(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-friendly label, used in log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Remote { .. } => "remote",
            Self::Decode(_) => "decode",
            Self::NotFound(_) => "not_found",
            Self::NotATable(_) => "not_a_table",
            Self::InvalidId(_) => "invalid_id",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
