//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed from the given settings.
    #[display("invalid client configuration: {_0}")]
    Client(#[error(not(source))] String),
    /// Connection failure, timeout, or the body could not be read.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The API answered with a non-success status code.
    #[display("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    /// The response body could not be decoded into the expected shape.
    #[display("invalid response from {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// The API has no entity under the requested identifier.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The source refused the request with an opaque description (possibly
    /// empty). Used by sources that are not backed by HTTP.
    #[display("{_0}")]
    Rejected(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
