//! The cumulative state of a sync session and its page-merge step.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use serde_json::Value;
use std::collections::HashSet;
use tracing::instrument;
use weft_decode::{Registry, Resolver, ResourceArray};
use weft_model::{Handle, ResourceKey};

/// The next call to make against a [`PageSource`](crate::PageSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    /// Start from scratch.
    Initial,
    /// Continue pagination of the current round (`nextPageUrl`).
    NextPage(String),
    /// Fetch everything changed since a completed round (`nextSyncUrl`).
    Resume(String),
}

/// Where a sync session stands.
///
/// ```text
/// Initial ──page──▶ Paginating ──page──▶ Complete
///    │                  │  ▲                │
///    │                  └──┘ page           │ page (delta round)
///    └──────┬───────────┴───────────────────┘
///           ▼ transport failure
///         Failed ──retry──▶ (state of the recorded request)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Initial,
    Paginating { next_page: String },
    Complete { next_sync: String },
    Failed { reason: String, resume: SyncRequest },
}

/// What merging one page did to the cumulative state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// 1-based number of the page within the session.
    pub page: u64,
    pub inserted: u64,
    pub replaced: u64,
    pub deleted: u64,
    /// Delete markers for ids that were never seen, or nodes repeated
    /// within the page.
    pub ignored: u64,
}

/// Cumulative result of every page merged so far.
///
/// Resources live in a single [`Registry`] for the whole session, so links
/// between resources delivered on different pages resolve as soon as both
/// have arrived. Iteration order is the order of first appearance; a delete
/// removes a resource from that order and a later re-insert appends it.
///
/// The registry only grows: a deleted resource and a link that never
/// resolved each keep their key and slot for the lifetime of the session, so
/// a later re-insert reuses the handle. Memory therefore grows with every
/// distinct key and every insertion the session has seen, not with the
/// number of live resources.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    registry: Registry,
    status: SyncStatus,
    pages: u64,
}
impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}
impl SyncState {
    pub fn new() -> Self {
        Self { registry: Registry::new(), status: SyncStatus::Initial, pages: 0 }
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Pages merged over the lifetime of the session.
    pub fn pages(&self) -> u64 {
        self.pages
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, SyncStatus::Complete { .. })
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// The request that continues this session from its current status.
    pub fn next_request(&self) -> SyncRequest {
        match &self.status {
            SyncStatus::Initial => SyncRequest::Initial,
            SyncStatus::Paginating { next_page } => SyncRequest::NextPage(next_page.clone()),
            SyncStatus::Complete { next_sync } => SyncRequest::Resume(next_sync.clone()),
            SyncStatus::Failed { resume, .. } => resume.clone(),
        }
    }

    /// Marks the session as failed. Merged pages are kept, and the request
    /// that was about to be made is recorded so a retry resumes rather than
    /// restarts.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let resume = self.next_request();
        self.status = SyncStatus::Failed { reason: reason.into(), resume };
    }

    /// Folds one raw sync page into the cumulative state.
    ///
    /// Every item is either a delete marker (`DeletedEntry`/`DeletedAsset`),
    /// which removes the matching resource if present, or a resource, which
    /// is inserted or replaces the previous version by id. Merging the same
    /// page twice leaves the same resources in the same order.
    ///
    /// A page that fails to merge leaves the state exactly as it was.
    #[instrument(skip(self, page), fields(page = self.pages + 1, inserted, replaced, deleted))]
    pub fn merge_page(&mut self, page: &Value) -> Result<MergeSummary> {
        let status = next_status(page)?;
        let items = match page.get("items") {
            Some(items) => items.as_array().ok_or_raise(|| ErrorKind::MalformedPayload("items"))?.as_slice(),
            None => &[],
        };

        // Vet the whole page before touching the session, so a malformed node
        // half-way through can't leave a partially merged state behind.
        let mut summary = MergeSummary { page: self.pages + 1, ..MergeSummary::default() };
        let mut checked = Vec::with_capacity(items.len());
        for node in items {
            match Resolver::check(node) {
                Ok(Some(sys)) => checked.push((sys, node)),
                Ok(None) => summary.ignored += 1,
                Err(e) => return Err(e.raise(ErrorKind::Decode)),
            }
        }

        let registry = &mut self.registry;
        registry.begin_pass();
        let unavailable = HashSet::new();
        let mut seen: HashSet<ResourceKey> = HashSet::new();
        for (sys, node) in checked {
            if let Some(target) = sys.kind.deletion_target() {
                let key = ResourceKey::new(target, sys.id);
                if registry.remove(&key) {
                    summary.deleted += 1;
                } else {
                    tracing::debug!(resource = %key, "Ignoring delete marker for unknown resource");
                    summary.ignored += 1;
                }
                continue;
            }
            if !seen.insert(sys.key()) {
                summary.ignored += 1;
                continue;
            }
            let existed = registry.lookup(sys.kind, &sys.id).is_some();
            Resolver::new(&mut *registry, &unavailable).resolve_checked(sys, node).or_raise(|| ErrorKind::Decode)?;
            match existed {
                true => summary.replaced += 1,
                false => summary.inserted += 1,
            }
        }

        self.status = status;
        self.pages += 1;
        let span = tracing::Span::current();
        span.record("inserted", summary.inserted);
        span.record("replaced", summary.replaced);
        span.record("deleted", summary.deleted);
        Ok(summary)
    }

    /// A finalized, read-only view of the cumulative state.
    ///
    /// Every live resource is an item, in order of first appearance, and
    /// `total` is their count. Links to resources not (or no longer) present
    /// are nulled in the snapshot only; the session itself keeps them
    /// pending, so a later page can still satisfy them.
    pub fn snapshot(&self) -> ResourceArray {
        let mut registry = self.registry.clone();
        registry.seal();
        let items: Vec<Handle> = registry.iter().map(|(handle, _)| handle).collect();
        ResourceArray::new(registry, items)
    }
}

/// Reads the status a page moves the session into from its tokens.
fn next_status(page: &Value) -> Result<SyncStatus> {
    let page = page.as_object().ok_or_raise(|| ErrorKind::MalformedPayload("page"))?;
    let token = |name: &'static str| -> Result<Option<String>> {
        match page.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(url)) => Ok(Some(url.clone())),
            Some(_) => exn::bail!(ErrorKind::MalformedPayload(name)),
        }
    };
    match (token("nextPageUrl")?, token("nextSyncUrl")?) {
        (Some(next_page), _) => Ok(SyncStatus::Paginating { next_page }),
        (None, Some(next_sync)) => Ok(SyncStatus::Complete { next_sync }),
        (None, None) => exn::bail!(ErrorKind::MalformedPayload("nextSyncUrl")),
    }
}
