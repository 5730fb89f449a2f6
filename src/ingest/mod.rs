// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::error::{NewsError, Result};
use crate::ingest::types::{NewsProvider, RawNewsItem};
use crate::item::{Item, Score, Source};
use crate::service::NewsService;

/// Descriptions longer than this many characters are cut.
pub const DESCRIPTION_MAX_CHARS: usize = 300;
pub const TRUNCATION_MARKER: &str = "…";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_total", "Provider fetch attempts.");
        describe_counter!(
            "news_fetch_errors_total",
            "Provider fetches that failed (transport, status or business error)."
        );
        describe_counter!(
            "news_items_inserted_total",
            "Items accepted by the store (first sighting of an id)."
        );
        describe_counter!(
            "news_items_malformed_total",
            "Provider records skipped by the normalizer."
        );
        describe_counter!("news_poll_cycles_total", "Completed poll cycles.");
        describe_histogram!("news_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!("news_cached_items", "Items held by the store.");
        describe_gauge!("news_subscribers", "Active streaming subscribers.");
        describe_counter!("news_events_sent_total", "Stream events queued to subscribers.");
        describe_counter!(
            "news_subscribers_dropped_total",
            "Subscribers removed after a failed write."
        );
    });
}

/// Provider epoch seconds → absolute instant. Out-of-range values fall back
/// to the Unix epoch.
pub fn epoch_secs_to_instant(secs: i64) -> DateTime<Utc> {
    secs.checked_mul(1000)
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}

/// Cut `s` to [`DESCRIPTION_MAX_CHARS`] characters plus a marker.
pub fn truncate_description(s: &str) -> String {
    if s.chars().count() <= DESCRIPTION_MAX_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(DESCRIPTION_MAX_CHARS).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Split the provider's `A|B|C` category string. Codes are kept verbatim,
/// surrounding whitespace included; only empty segments are dropped.
pub fn parse_categories(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split('|')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn host_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches("www.").to_string())
}

/// Raw provider record → canonical [`Item`].
///
/// Fails with [`NewsError::MalformedItem`] when the record is not an object or
/// has no id; callers skip such records and keep going. Other fields of the
/// wrong type fall back to their defaults.
pub fn normalize(raw: &serde_json::Value) -> Result<Item> {
    if !raw.is_object() {
        return Err(NewsError::MalformedItem("record is not an object".into()));
    }
    let rec = RawNewsItem::deserialize(raw).map_err(|e| NewsError::MalformedItem(e.to_string()))?;
    let id = rec
        .id
        .ok_or_else(|| NewsError::MalformedItem("record has no id".into()))?;

    let url = rec.url.unwrap_or_default();
    let info = rec.source_info.unwrap_or_default();
    let source_title = info
        .name
        .or(rec.source)
        .unwrap_or_default();
    let domain = host_of(&url).unwrap_or_else(|| source_title.clone());
    let published_at = epoch_secs_to_instant(rec.published_on.unwrap_or(0));

    Ok(Item {
        id,
        title: rec.title.unwrap_or_default(),
        url,
        description: truncate_description(rec.body.as_deref().unwrap_or_default()),
        published_at,
        created_at: published_at,
        source: Source {
            title: source_title,
            domain: domain.clone(),
            icon: info.img,
        },
        domain,
        categories: parse_categories(rec.categories.as_deref()),
        thumbnail: rec.imageurl.filter(|u| !u.is_empty()),
        tags: rec.tags,
        score: Score {
            up: rec.upvotes.unwrap_or(0),
            down: rec.downvotes.unwrap_or(0),
        },
        raw: raw.clone(),
    })
}

/// What one poll cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub malformed: usize,
    pub inserted: usize,
    pub error: Option<String>,
}

/// Run one fetch → normalize → insert → rebuild → notify cycle.
///
/// Never fails: a provider error is recorded as health state and reported in
/// the returned [`CycleReport`]; the cache keeps serving what it had.
pub async fn run_once(provider: &dyn NewsProvider, service: &NewsService) -> CycleReport {
    ensure_metrics_described();

    let t0 = Instant::now();
    counter!("news_fetch_total").increment(1);

    let raw = match provider.fetch_batch(service.topics()).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, provider = provider.name(), "feed fetch failed");
            counter!("news_fetch_errors_total").increment(1);
            let message = e.to_string();
            service.record_failure(message.clone());
            return CycleReport {
                error: Some(message),
                ..CycleReport::default()
            };
        }
    };
    histogram!("news_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let mut items = Vec::with_capacity(raw.len());
    let mut malformed = 0usize;
    for rec in &raw {
        match normalize(rec) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::debug!(target: "ingest", error = %e, "skipping record");
                malformed += 1;
            }
        }
    }

    let inserted = service.apply(items);
    service.record_success();

    counter!("news_items_inserted_total").increment(inserted as u64);
    counter!("news_items_malformed_total").increment(malformed as u64);

    CycleReport {
        fetched: raw.len(),
        malformed,
        inserted,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_is_cut_at_300_chars() {
        let long = "é".repeat(301);
        let out = truncate_description(&long);
        assert_eq!(out.chars().count(), 301);
        assert!(out.ends_with(TRUNCATION_MARKER));

        let exact = "x".repeat(300);
        assert_eq!(truncate_description(&exact), exact);
    }

    #[test]
    fn categories_split_on_pipe() {
        assert_eq!(parse_categories(Some("BTC|ETH|Trading")), vec!["BTC", "ETH", "Trading"]);
        assert!(parse_categories(Some("")).is_empty());
        assert!(parse_categories(None).is_empty());
        assert_eq!(parse_categories(Some("btc||ETH")), vec!["btc", "ETH"]);
        assert_eq!(parse_categories(Some("BTC| ETH ")), vec!["BTC", " ETH "]);
    }

    #[test]
    fn epoch_seconds_become_millisecond_instants() {
        let t = epoch_secs_to_instant(1_700_000_000);
        assert_eq!(t.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(epoch_secs_to_instant(i64::MAX).timestamp(), 0);
    }

    #[test]
    fn numeric_id_and_string_counters_are_accepted() {
        let raw = json!({ "id": 42, "upvotes": "7", "downvotes": 1 });
        let it = normalize(&raw).unwrap();
        assert_eq!(it.id, "42");
        assert_eq!(it.score, Score { up: 7, down: 1 });
    }

    #[test]
    fn non_object_record_is_malformed() {
        assert!(matches!(
            normalize(&json!("just a string")),
            Err(NewsError::MalformedItem(_))
        ));
    }
}
