//! Sync Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The page source failed to deliver a page (network, server error).
    #[display("transport error: {_0}")]
    Transport(#[error(not(source))] String),
    /// Pagination stopped part-way. Pages merged so far are kept; the
    /// state's recorded request resumes it.
    #[display("sync interrupted after {pages} page(s)")]
    Interrupted { pages: u64 },
    /// A page could not be decoded into resources.
    #[display("sync page could not be decoded")]
    Decode,
    /// A page is missing its pagination token or has an unusable shape.
    #[display("malformed sync page: missing or invalid '{_0}'")]
    MalformedPayload(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Interrupted { .. })
    }
}
