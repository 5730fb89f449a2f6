// src/ingest/providers/scripted.rs
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{NewsError, Result};
use crate::ingest::providers::feed_api::parse_feed_response;
use crate::ingest::types::NewsProvider;

// --- Test helper ---
/// Provider that replays queued outcomes, one per fetch. An empty queue
/// answers with an empty batch.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Vec<serde_json::Value>>>>,
    calls: AtomicUsize,
    last_topics: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful batch.
    pub fn push_batch(&self, items: Vec<serde_json::Value>) {
        self.script.lock().push_back(Ok(items));
    }

    /// Queue a failed fetch.
    pub fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .push_back(Err(NewsError::ProviderFetchFailed(message.to_string())));
    }

    /// Queue a raw response body, decoded the same way the HTTP provider does.
    pub fn push_body(&self, body: &str) {
        self.script.lock().push_back(parse_feed_response(body));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Topics passed to the most recent fetch.
    pub fn last_topics(&self) -> Vec<String> {
        self.last_topics.lock().clone()
    }
}

#[async_trait]
impl NewsProvider for ScriptedProvider {
    async fn fetch_batch(&self, topics: &[String]) -> Result<Vec<serde_json::Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_topics.lock() = topics.to_vec();
        self.script.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
