use crate::error::{ErrorKind, Result};
use crate::source::PageSource;
use crate::state::{MergeSummary, SyncRequest, SyncState};
use async_stream::stream;
use futures::Stream;

/// Limits for one run of [`sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Stop after fetching this many pages, leaving the session resumable.
    /// `None` runs until the round completes.
    pub max_pages: Option<u64>,
}

/// Progress events emitted by [`sync`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`Merged`](Self::Merged), once per page.
/// 3. [`Complete`](Self::Complete) or [`Paused`](Self::Paused), exactly once.
///
/// A failure terminates the stream early with an `Err` item instead, after
/// which the state is [`Failed`](crate::SyncStatus::Failed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Syncing has begun with this request.
    Started(SyncRequest),
    /// A page has been merged into the state.
    Merged(MergeSummary),
    /// The page limit was reached before the round completed; the request
    /// that continues it is included.
    Paused(SyncRequest),
    /// The round is complete; the state now holds a `nextSyncUrl`.
    Complete { pages: u64 },
}

/// Drives `state` forward by pulling pages from `source` until the current
/// round completes.
///
/// Starting from [`Initial`](crate::SyncStatus::Initial) performs a full
/// sync; starting from [`Complete`](crate::SyncStatus::Complete) performs a
/// delta round from its `nextSyncUrl`; starting from
/// [`Failed`](crate::SyncStatus::Failed) retries the request that failed.
///
/// The stream suspends only at page boundaries. Dropping it between pages
/// leaves `state` consistent and resumable.
pub fn sync<'a>(
    source: &'a dyn PageSource,
    state: &'a mut SyncState,
    options: SyncOptions,
) -> impl Stream<Item = Result<SyncEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(SyncEvent::Started(state.next_request()));

        let mut fetched: u64 = 0;
        loop {
            if options.max_pages.is_some_and(|max| fetched >= max) {
                tracing::debug!(source = source.name(), pages = fetched, "Page limit reached; pausing sync");
                yield Ok(SyncEvent::Paused(state.next_request()));
                return;
            }

            let request = state.next_request();
            let page = match source.fetch(&request).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        error = %*e,
                        pages = state.pages(),
                        "Sync interrupted by transport failure"
                    );
                    state.fail((*e).to_string());
                    let pages = state.pages();
                    yield Err(e.raise(ErrorKind::Interrupted { pages }));
                    return;
                },
            };
            fetched += 1;

            match state.merge_page(&page) {
                Ok(summary) => yield Ok(SyncEvent::Merged(summary)),
                Err(e) => {
                    state.fail((*e).to_string());
                    yield Err(e);
                    return;
                },
            }
            if state.is_complete() {
                yield Ok(SyncEvent::Complete { pages: state.pages() });
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockPageSource;
    use crate::state::SyncStatus;
    use futures::StreamExt;
    use serde_json::{Value, json};

    fn cat(id: &str) -> Value {
        json!({"sys": {"type": "Entry", "id": id}, "fields": {"name": {"en-US": id}}})
    }

    fn pages() -> [Value; 3] {
        [
            json!({"items": [cat("a")], "nextPageUrl": "page-2"}),
            json!({"items": [cat("b")], "nextPageUrl": "page-3"}),
            json!({"items": [cat("c")], "nextSyncUrl": "delta-1"}),
        ]
    }

    #[tokio::test]
    async fn test_runs_until_complete() {
        let source = MockPageSource::with_pages(pages());
        let mut state = SyncState::new();
        let events: Vec<_> = sync(&source, &mut state, SyncOptions::default()).collect().await;
        let events: Vec<SyncEvent> = events.into_iter().map(Result::unwrap).collect();

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], SyncEvent::Started(SyncRequest::Initial));
        assert!(matches!(events[3], SyncEvent::Merged(MergeSummary { page: 3, inserted: 1, .. })));
        assert_eq!(events[4], SyncEvent::Complete { pages: 3 });
        assert_eq!(state.status(), &SyncStatus::Complete { next_sync: "delta-1".to_string() });
        assert_eq!(state.len(), 3);
        assert_eq!(
            source.requests().await,
            [
                SyncRequest::Initial,
                SyncRequest::NextPage("page-2".to_string()),
                SyncRequest::NextPage("page-3".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_preserves_merged_pages_and_resumes() {
        let [first, second, third] = pages();
        let source = MockPageSource::with_pages([first]);
        source.push_failure("connection reset").await;
        let mut state = SyncState::new();

        let events: Vec<_> = sync(&source, &mut state, SyncOptions::default()).collect().await;
        let err = events.into_iter().last().unwrap().unwrap_err();
        assert_eq!(*err, ErrorKind::Interrupted { pages: 1 });
        assert!(err.is_retryable());
        assert!(matches!(state.status(), SyncStatus::Failed { .. }));
        assert_eq!(state.len(), 1);

        source.push_page(second).await;
        source.push_page(third).await;
        let events: Vec<_> = sync(&source, &mut state, SyncOptions::default()).collect().await;
        assert!(events.iter().all(Result::is_ok));
        assert!(state.is_complete());
        assert_eq!(state.len(), 3);
        // The retry picked up where the failure left off.
        assert_eq!(source.requests().await[2], SyncRequest::NextPage("page-2".to_string()));
    }

    #[tokio::test]
    async fn test_page_limit_pauses() {
        let source = MockPageSource::with_pages(pages());
        let mut state = SyncState::new();
        let options = SyncOptions { max_pages: Some(2) };
        let events: Vec<_> = sync(&source, &mut state, options).collect().await;
        let last = events.into_iter().last().unwrap().unwrap();
        assert_eq!(last, SyncEvent::Paused(SyncRequest::NextPage("page-3".to_string())));
        assert_eq!(state.pages(), 2);

        let events: Vec<_> = sync(&source, &mut state, options).collect().await;
        assert_eq!(events.into_iter().last().unwrap().unwrap(), SyncEvent::Complete { pages: 3 });
    }

    #[tokio::test]
    async fn test_delta_round_applies_deletes() {
        let source = MockPageSource::with_pages(pages());
        let mut state = SyncState::new();
        let _: Vec<_> = sync(&source, &mut state, SyncOptions::default()).collect().await;

        source
            .push_page(json!({
                "items": [{"sys": {"type": "DeletedEntry", "id": "b"}}, cat("d")],
                "nextSyncUrl": "delta-2"
            }))
            .await;
        let events: Vec<_> = sync(&source, &mut state, SyncOptions::default()).collect().await;
        assert_eq!(events[0].as_ref().unwrap(), &SyncEvent::Started(SyncRequest::Resume("delta-1".to_string())));
        let ids: Vec<String> = state.snapshot().entries().map(|e| e.sys.id.clone()).collect();
        assert_eq!(ids, ["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_malformed_page_fails_without_merging() {
        let source = MockPageSource::with_pages([json!({"items": [cat("a")]})]);
        let mut state = SyncState::new();
        let events: Vec<_> = sync(&source, &mut state, SyncOptions::default()).collect().await;
        let err = events.into_iter().last().unwrap().unwrap_err();
        assert_eq!(*err, ErrorKind::MalformedPayload("nextSyncUrl"));
        assert!(state.is_empty());
        assert_eq!(state.next_request(), SyncRequest::Initial);
    }
}
