//! Incremental synchronization of content delivery pages.
//!
//! A sync session folds a sequence of pages into one cumulative
//! [`SyncState`]: resources are inserted or replaced by id, delete markers
//! remove them, and first-seen order is kept for stable iteration. The
//! [`sync`] driver pulls pages from a [`PageSource`] until the round
//! completes, suspending only between pages; a transport failure marks the
//! state [`Failed`](SyncStatus::Failed) without discarding merged pages, so
//! the next run resumes instead of restarting.

pub mod error;
mod source;
mod state;
mod stream;

#[cfg(any(test, feature = "mock"))]
pub use crate::source::MockPageSource;
pub use crate::source::PageSource;
pub use crate::state::{MergeSummary, SyncRequest, SyncState, SyncStatus};
pub use crate::stream::{SyncEvent, SyncOptions, sync};
