//! # Store
//! Deduplicating, bounded cache of news items with one global "latest" view
//! and one view per whitelisted topic.
//!
//! The store is mutated only through [`Store::insert`] and [`Store::rebuild`].
//! Views change only inside `rebuild`, so a reader never sees the global view
//! and the topic views disagree.

use std::collections::{hash_map::Entry, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{NewsError, Result};
use crate::item::{newest_first, Item};

/// Cap of the global "latest" view.
pub const LATEST_CAP: usize = 200;
/// Cap of each per-topic view.
pub const TOPIC_CAP: usize = 5;

#[derive(Debug, Default)]
pub struct Store {
    items: HashMap<String, Arc<Item>>,
    latest: Vec<Arc<Item>>,
    by_topic: HashMap<String, Vec<Arc<Item>>>,
    topics: Vec<String>,
}

impl Store {
    /// Create an empty store with a view for every topic code in `topics`.
    pub fn new(topics: Vec<String>) -> Self {
        let by_topic = topics.iter().map(|t| (t.clone(), Vec::new())).collect();
        Self {
            items: HashMap::new(),
            latest: Vec::new(),
            by_topic,
            topics,
        }
    }

    /// Add `item` unless its id is already known. First write wins: an
    /// existing record is never replaced. Returns whether anything changed.
    pub fn insert(&mut self, item: Item) -> bool {
        match self.items.entry(item.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(item));
                true
            }
        }
    }

    /// Recompute every view from the primary map, then drop items that no
    /// view retains anymore.
    ///
    /// Idempotent for an unchanged map. Callers batch: insert a whole fetch
    /// cycle, then rebuild once.
    pub fn rebuild(&mut self) {
        let mut all: Vec<Arc<Item>> = self.items.values().cloned().collect();
        all.sort_by(|a, b| newest_first(a, b));

        let by_topic: HashMap<String, Vec<Arc<Item>>> = self
            .topics
            .iter()
            .map(|topic| {
                let view = all
                    .iter()
                    .filter(|it| it.has_category(topic))
                    .take(TOPIC_CAP)
                    .cloned()
                    .collect();
                (topic.clone(), view)
            })
            .collect();

        all.truncate(LATEST_CAP);

        let retained: HashSet<&str> = all
            .iter()
            .chain(by_topic.values().flatten())
            .map(|it| it.id.as_str())
            .collect();
        self.items.retain(|id, _| retained.contains(id.as_str()));

        self.latest = all;
        self.by_topic = by_topic;
    }

    /// First `limit` items of the global view (fewer if the view is shorter).
    pub fn latest(&self, limit: usize) -> Vec<Arc<Item>> {
        self.latest.iter().take(limit).cloned().collect()
    }

    /// First `limit` items of `topic`'s view.
    pub fn by_topic(&self, topic: &str, limit: usize) -> Result<Vec<Arc<Item>>> {
        let view = self
            .by_topic
            .get(topic)
            .ok_or_else(|| NewsError::UnknownTopic(topic.to_string()))?;
        Ok(view.iter().take(limit).cloned().collect())
    }

    /// The whole global view as of the last rebuild.
    pub fn latest_view(&self) -> &[Arc<Item>] {
        &self.latest
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Number of items in the primary map.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
