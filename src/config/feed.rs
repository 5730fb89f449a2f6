// src/config/feed.rs
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ingest::config::{load_topics_default, TopicsSource};

pub const DEFAULT_FEED_URL: &str = "https://min-api.cryptocompare.com/data/v2/news/";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 120_000;
const MIN_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub feed_url: String,
    /// Optional; the feed works anonymously with a lower rate limit.
    pub api_key: Option<String>,
    pub poll_interval_ms: u64,
    pub fetch_timeout_secs: u64,
    /// Whitelisted topic codes, upper-cased.
    pub topics: Vec<String>,
    pub topics_source: TopicsSource,
}

impl FeedConfig {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self> {
        let poll_interval_ms = env_u64("NEWS_POLL_INTERVAL_MS")
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(MIN_POLL_INTERVAL_MS);
        let fetch_timeout_secs =
            env_u64("NEWS_FETCH_TIMEOUT_SECS").unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        let feed_url =
            std::env::var("NEWS_FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        let api_key = std::env::var("NEWS_FEED_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let list = load_topics_default().context("loading topic whitelist")?;
        tracing::info!(source = %list.source, count = list.topics.len(), "topic whitelist loaded");

        Ok(Self {
            feed_url,
            api_key,
            poll_interval_ms,
            fetch_timeout_secs,
            topics: list.topics,
            topics_source: list.source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
