//! # Item
//! Canonical news record held by the store. Built once by the normalizer and
//! never mutated afterwards; views share it through `Arc<Item>`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub domain: String,
    pub source: Source,
    pub categories: Vec<String>,
    pub thumbnail: Option<String>,
    /// Provider tags, passed through untouched.
    pub tags: serde_json::Value,
    pub score: Score,
    /// The original provider record.
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub domain: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Score {
    pub up: u64,
    pub down: u64,
}

impl Item {
    pub fn has_category(&self, code: &str) -> bool {
        self.categories.iter().any(|c| c == code)
    }
}

/// Newest first: `published_at` desc, then `created_at` desc, then id asc so
/// equal timestamps still sort the same way every rebuild.
pub fn newest_first(a: &Item, b: &Item) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
