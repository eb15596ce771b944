//! Model Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required part of a resource payload is missing or has the wrong
    /// shape. The transport contract was violated; don't retry with the same
    /// payload.
    #[display("malformed payload: missing or invalid '{_0}'")]
    MalformedPayload(#[error(not(source))] &'static str),
    /// The payload names a resource type this crate does not model.
    #[display("unknown resource type: {_0}")]
    UnknownType(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A payload is either well-formed or it isn't.
        false
    }
}
