//! Decode Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Unresolvable links are deliberately absent from this list: they degrade to
//! missing field values and never fail a decode.

use derive_more::{Display, Error};
use weft_model::ResourceType;

/// A decode error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The page violates the transport contract (e.g. a resource without
    /// `sys.id`). The section of the page is named.
    #[display("malformed payload in '{_0}'")]
    MalformedPayload(#[error(not(source))] &'static str),
    /// An explicit single-resource lookup matched nothing.
    #[display("Could not find id '{id}' of type '{kind}'.")]
    NotFound { id: String, kind: ResourceType },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
