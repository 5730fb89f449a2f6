//! Change fan-out to streaming subscribers.
//!
//! Every subscriber owns a bounded channel and a set of ids it has already
//! been sent. After each store rebuild the poll loop calls
//! [`Broadcaster::on_store_changed`], which queues the unseen head of the
//! "latest" view to each subscriber without ever waiting on one of them.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{NewsError, Result};
use crate::item::Item;
use crate::store::LATEST_CAP;

/// Items in the snapshot event sent on subscribe.
pub const SNAPSHOT_SIZE: usize = 20;
/// How deep into the "latest" view each notification pass looks.
pub const SCAN_DEPTH: usize = 50;
/// Events a subscriber may have queued before it counts as failed.
pub const SUBSCRIBER_BUFFER: usize = 64;

pub type SubscriberId = Uuid;

/// Event pushed to a subscriber.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Most recent items at subscribe time.
    Snapshot { items: Vec<Arc<Item>> },
    /// Items that became visible since the last event.
    New { items: Vec<Arc<Item>> },
}

impl StreamEvent {
    /// SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Snapshot { .. } => "snapshot",
            StreamEvent::New { .. } => "new",
        }
    }

    pub fn items(&self) -> &[Arc<Item>] {
        match self {
            StreamEvent::Snapshot { items } | StreamEvent::New { items } => items,
        }
    }
}

struct Subscriber {
    tx: mpsc::Sender<StreamEvent>,
    delivered: HashSet<String>,
}

impl Subscriber {
    fn deliver(&self, event: StreamEvent) -> Result<()> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => NewsError::SubscriberWriteFailed("buffer full".into()),
            TrySendError::Closed(_) => NewsError::SubscriberWriteFailed("disconnected".into()),
        })
    }
}

pub struct Broadcaster {
    subscribers: DashMap<SubscriberId, Subscriber>,
    buffer: usize,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_buffer(SUBSCRIBER_BUFFER)
    }

    /// Broadcaster whose subscribers may queue at most `buffer` events.
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Register a subscriber against the current "latest" view.
    ///
    /// The snapshot event is queued before the subscriber becomes visible to
    /// notification passes, so it is always the first event received.
    pub fn subscribe(self: &Arc<Self>, latest: &[Arc<Item>]) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();

        let snapshot = latest.iter().take(SNAPSHOT_SIZE).cloned().collect();
        // fresh channel with capacity >= 1, cannot be full
        let _ = tx.try_send(StreamEvent::Snapshot { items: snapshot });

        let delivered = latest
            .iter()
            .take(LATEST_CAP)
            .map(|it| it.id.clone())
            .collect();
        self.subscribers.insert(id, Subscriber { tx, delivered });
        counter!("news_events_sent_total").increment(1);
        gauge!("news_subscribers").set(self.subscribers.len() as f64);
        info!(subscriber = %id, "subscriber connected");

        Subscription {
            id,
            rx,
            broadcaster: Arc::clone(self),
        }
    }

    /// Remove a subscriber. Safe at any time, including during a pass.
    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            gauge!("news_subscribers").set(self.subscribers.len() as f64);
            info!(subscriber = %id, "subscriber disconnected");
        }
        removed
    }

    /// Push unseen items from the head of `latest` to every subscriber.
    /// Returns how many events were queued.
    ///
    /// A subscriber whose write fails is removed; the pass continues with
    /// the others.
    pub fn on_store_changed(&self, latest: &[Arc<Item>]) -> usize {
        let window = &latest[..latest.len().min(SCAN_DEPTH)];
        let retained: HashSet<&str> = latest.iter().map(|it| it.id.as_str()).collect();
        let mut sent = 0usize;
        let mut dropped = 0usize;

        self.subscribers.retain(|id, sub| {
            if sub.tx.is_closed() {
                dropped += 1;
                return false;
            }

            let fresh: Vec<Arc<Item>> = window
                .iter()
                .filter(|it| !sub.delivered.contains(&it.id))
                .cloned()
                .collect();

            if !fresh.is_empty() {
                let ids: Vec<String> = fresh.iter().map(|it| it.id.clone()).collect();
                if let Err(e) = sub.deliver(StreamEvent::New { items: fresh }) {
                    warn!(subscriber = %id, error = %e, "dropping subscriber");
                    dropped += 1;
                    return false;
                }
                sub.delivered.extend(ids);
                sent += 1;
            }

            // ids that left the retained window can never come back into it
            sub.delivered.retain(|d| retained.contains(d.as_str()));
            true
        });

        if sent > 0 || dropped > 0 {
            debug!(sent, dropped, "store change broadcast");
        }
        counter!("news_events_sent_total").increment(sent as u64);
        counter!("news_subscribers_dropped_total").increment(dropped as u64);
        gauge!("news_subscribers").set(self.subscribers.len() as f64);
        sent
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<StreamEvent>,
    broadcaster: Arc<Broadcaster>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event; `None` once the broadcaster dropped this subscriber.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Next already-queued event, without waiting.
    pub fn try_recv(&mut self) -> Option<StreamEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unsubscribe(&self.id);
    }
}
