// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod ingest;
pub mod item;
pub mod metrics;
pub mod service;
pub mod store;

use std::sync::Arc;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::{NewsError, Result};
pub use crate::item::Item;
pub use crate::service::NewsService;

use crate::config::FeedConfig;
use crate::ingest::providers::FeedApiProvider;
use crate::ingest::scheduler::{spawn_poller, PollerHandle};

/// Build the shared service and start polling the configured feed.
///
/// Must be called inside a Tokio runtime. Keep the returned handle to stop
/// the poller on shutdown; dropping it leaves the poller running.
pub fn start(cfg: &FeedConfig) -> (Arc<NewsService>, PollerHandle) {
    let service = Arc::new(NewsService::new(cfg.topics.clone(), cfg.poll_interval()));
    let provider = FeedApiProvider::new(cfg.feed_url.clone())
        .with_api_key(cfg.api_key.clone())
        .with_timeout(cfg.fetch_timeout());
    let poller = spawn_poller(service.clone(), Arc::new(provider), cfg.poll_interval());
    tracing::info!(
        feed = %cfg.feed_url,
        topics = ?cfg.topics,
        poll_interval_ms = cfg.poll_interval_ms,
        "news cache started"
    );
    (service, poller)
}
