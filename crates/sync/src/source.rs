//! The transport collaborator a sync session pulls pages from.

#[cfg(any(test, feature = "mock"))]
mod mock;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockPageSource;
use crate::error::Result;
use crate::state::SyncRequest;
use async_trait::async_trait;
use serde_json::Value;

/// Delivers raw sync pages, one per call.
///
/// Implementations own everything transport-related (URLs, authentication,
/// retries, rate limiting); the sync driver only hands over the
/// [`SyncRequest`] derived from the session state and merges whatever page
/// comes back. Failures should be raised as
/// [`ErrorKind::Transport`](crate::error::ErrorKind::Transport).
///
/// # Examples
///
/// ```
/// use serde_json::Value;
/// use weft_sync::{PageSource, SyncRequest};
/// use weft_sync::error::Result;
///
/// async fn first_page(source: &dyn PageSource) -> Result<Value> {
///     source.fetch(&SyncRequest::Initial).await
/// }
/// ```
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Human-readable name of the source, used in logs.
    fn name(&self) -> &str;

    /// Fetches the page answering `request`.
    async fn fetch(&self, request: &SyncRequest) -> Result<Value>;
}
