//! # News service
//! Shared state behind the poll loop and the HTTP layer: the store, the
//! broadcaster and fetch health, plus the read-only query facade.
//!
//! The poll loop is the only writer ([`NewsService::apply`],
//! [`NewsService::record_success`], [`NewsService::record_failure`]).
//! Readers take the store's read lock only long enough to clone `Arc`s out of
//! a view.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::gauge;
use parking_lot::RwLock;
use serde::Serialize;

use crate::broadcast::{Broadcaster, Subscription};
use crate::error::{NewsError, Result};
use crate::item::Item;
use crate::store::Store;

/// Limits accepted by `latest`/`by_topic` are clamped into this range.
pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 5;
/// Quote currency stripped from ticker-style topics (`BTCUSDT` → `BTC`).
pub const QUOTE_SUFFIX: &str = "USDT";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct FetchState {
    last_fetch_at: Option<DateTime<Utc>>,
    last_error: Option<FetchFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub ok: bool,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub poll_interval_ms: u64,
    pub cached_count: usize,
    pub last_error: Option<FetchFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub count: usize,
    pub items: Vec<Arc<Item>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicResponse {
    pub topic: String,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub count: usize,
    pub items: Vec<Arc<Item>>,
}

pub struct NewsService {
    store: RwLock<Store>,
    broadcaster: Arc<Broadcaster>,
    fetch: RwLock<FetchState>,
    topics: Vec<String>,
    poll_interval: Duration,
}

impl NewsService {
    pub fn new(topics: Vec<String>, poll_interval: Duration) -> Self {
        Self::with_broadcaster(topics, poll_interval, Broadcaster::new())
    }

    pub fn with_broadcaster(
        topics: Vec<String>,
        poll_interval: Duration,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            store: RwLock::new(Store::new(topics.clone())),
            broadcaster: Arc::new(broadcaster),
            fetch: RwLock::new(FetchState::default()),
            topics,
            poll_interval,
        }
    }

    /// Whitelisted topic codes.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    // --- writer side (poll loop) ---

    /// Insert a cycle's items, then rebuild once and notify subscribers if
    /// anything was new. Returns the number of items inserted.
    ///
    /// Inserts and rebuild share one write guard, so readers see either the
    /// old views or the new ones. Notification runs after the guard is
    /// released: a subscriber never sees an item `latest` does not have.
    pub fn apply(&self, items: Vec<Item>) -> usize {
        let (inserted, latest) = {
            let mut store = self.store.write();
            let mut inserted = 0usize;
            for item in items {
                if store.insert(item) {
                    inserted += 1;
                }
            }
            if inserted == 0 {
                return 0;
            }
            store.rebuild();
            gauge!("news_cached_items").set(store.len() as f64);
            (inserted, store.latest_view().to_vec())
        };

        self.broadcaster.on_store_changed(&latest);
        inserted
    }

    pub fn record_success(&self) {
        let mut f = self.fetch.write();
        f.last_fetch_at = Some(Utc::now());
        f.last_error = None;
    }

    pub fn record_failure(&self, message: String) {
        self.fetch.write().last_error = Some(FetchFailure {
            message,
            at: Utc::now(),
        });
    }

    // --- query facade ---

    pub fn health(&self) -> Health {
        let (last_fetch_at, last_error) = {
            let f = self.fetch.read();
            (f.last_fetch_at, f.last_error.clone())
        };
        Health {
            ok: last_error.is_none(),
            last_fetch_at,
            poll_interval_ms: self.poll_interval.as_millis() as u64,
            cached_count: self.store.read().len(),
            last_error,
        }
    }

    /// Newest items, `limit` clamped to 1..=5.
    pub fn latest(&self, limit: usize) -> LatestResponse {
        let items = self.store.read().latest(clamp_limit(limit));
        LatestResponse {
            last_fetch_at: self.fetch.read().last_fetch_at,
            count: items.len(),
            items,
        }
    }

    /// Newest items for a topic. Accepts ticker forms such as `btcusdt`.
    pub fn by_topic(&self, topic: &str, limit: usize) -> Result<TopicResponse> {
        let topic = normalize_topic(topic);
        if !self.topics.iter().any(|t| *t == topic) {
            return Err(NewsError::UnsupportedTopic {
                topic,
                supported: self.topics.clone(),
            });
        }
        let items = self.store.read().by_topic(&topic, clamp_limit(limit))?;
        Ok(TopicResponse {
            topic,
            last_fetch_at: self.fetch.read().last_fetch_at,
            count: items.len(),
            items,
        })
    }

    /// Open a stream subscription. The first event is a snapshot of the
    /// newest items.
    pub fn subscribe(&self) -> Subscription {
        // hold the read guard while registering so no rebuild slips between
        // seeding and registration
        let store = self.store.read();
        self.broadcaster.subscribe(store.latest_view())
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }
}

pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Upper-case and strip the quote-currency suffix: `btcusdt` → `BTC`.
/// A bare `USDT` is left as is.
pub fn normalize_topic(raw: &str) -> String {
    let upper = raw.trim().to_ascii_uppercase();
    match upper.strip_suffix(QUOTE_SUFFIX) {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => upper,
    }
}
