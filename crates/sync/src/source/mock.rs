//! In-memory page source for testing.

use super::PageSource;
use crate::error::{ErrorKind, Result};
use crate::state::SyncRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Serves canned pages in order, with injectable transport failures.
///
/// Every request received is recorded so tests can assert on the resume
/// behaviour of the driver.
#[derive(Default)]
pub struct MockPageSource {
    responses: Mutex<VecDeque<std::result::Result<Value, String>>>,
    requests: Mutex<Vec<SyncRequest>>,
}

impl MockPageSource {
    pub fn with_pages(pages: impl IntoIterator<Item = Value>) -> Self {
        Self {
            responses: Mutex::new(pages.into_iter().map(Ok).collect()),
            requests: Mutex::default(),
        }
    }

    /// Queues a page to be served after everything already queued.
    pub async fn push_page(&self, page: Value) {
        self.responses.lock().await.push_back(Ok(page));
    }

    /// Queues a transport failure to be raised after everything already
    /// queued.
    pub async fn push_failure(&self, reason: impl Into<String>) {
        self.responses.lock().await.push_back(Err(reason.into()));
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<SyncRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: &SyncRequest) -> Result<Value> {
        self.requests.lock().await.push(request.clone());
        match self.responses.lock().await.pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(reason)) => exn::bail!(ErrorKind::Transport(reason)),
            None => exn::bail!(ErrorKind::Transport("no more pages queued".to_string())),
        }
    }
}
