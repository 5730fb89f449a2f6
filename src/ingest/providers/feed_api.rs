// src/ingest/providers/feed_api.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{NewsError, Result};
use crate::ingest::types::NewsProvider;

/// Business status the feed reports on success.
pub const SUCCESS_STATUS: i64 = 100;

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    #[serde(rename = "Type", alias = "businessStatus", default)]
    status: Option<i64>,
    #[serde(rename = "Message", alias = "message", default)]
    message: Option<String>,
    #[serde(rename = "Data", alias = "items", default)]
    data: serde_json::Value,
}

/// Decode a feed response body into its raw records.
///
/// A business status other than [`SUCCESS_STATUS`] is a failed fetch even
/// when the HTTP status was 2xx.
pub fn parse_feed_response(body: &str) -> Result<Vec<serde_json::Value>> {
    let env: FeedEnvelope = serde_json::from_str(body)
        .map_err(|e| NewsError::ProviderFetchFailed(format!("undecodable body: {e}")))?;

    if env.status != Some(SUCCESS_STATUS) {
        let status = env
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "missing".into());
        return Err(NewsError::ProviderFetchFailed(format!(
            "business status {status}: {}",
            env.message.unwrap_or_default()
        )));
    }

    match env.data {
        serde_json::Value::Array(items) => Ok(items),
        // the feed sends `{}` or null instead of `[]` when there is nothing
        _ => Ok(Vec::new()),
    }
}

/// HTTP news feed. One GET per cycle, all topics in a single comma-joined
/// `categories` parameter.
#[derive(Clone)]
pub struct FeedApiProvider {
    url: String,
    api_key: Option<String>,
    client: Client,
    timeout: Duration,
}

impl FeedApiProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            client: Client::new(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NewsProvider for FeedApiProvider {
    async fn fetch_batch(&self, topics: &[String]) -> Result<Vec<serde_json::Value>> {
        let categories = topics.join(",");
        let mut req = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .query(&[("lang", "EN"), ("categories", categories.as_str())]);
        if let Some(key) = &self.api_key {
            req = req.query(&[("api_key", key.as_str())]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| NewsError::ProviderFetchFailed(format!("request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NewsError::ProviderFetchFailed(format!("HTTP {status}")));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| NewsError::ProviderFetchFailed(format!("reading body: {e}")))?;

        let items = parse_feed_response(&body)?;
        tracing::debug!(target: "ingest", count = items.len(), topics = %categories, "feed batch received");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "feed-api"
    }
}
