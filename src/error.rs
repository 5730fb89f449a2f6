//! Error types for the news cache engine.

use thiserror::Error;

/// Every failure the engine can report. None of these is fatal to the process:
/// record- and cycle-level errors are absorbed into health state, caller-input
/// errors are returned to the caller, subscriber errors drop that subscriber.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NewsError {
    /// A provider record that cannot become an `Item` (usually: no id).
    #[error("malformed item: {0}")]
    MalformedItem(String),

    /// The upstream call failed (transport, HTTP status, business status or body).
    #[error("provider fetch failed: {0}")]
    ProviderFetchFailed(String),

    /// Query-facade topic that is not in the configured whitelist.
    #[error("unsupported topic: {topic}")]
    UnsupportedTopic {
        topic: String,
        supported: Vec<String>,
    },

    /// Store-level lookup of a topic without a materialized view.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// Delivery into a subscriber's channel failed (full or disconnected).
    #[error("subscriber write failed: {0}")]
    SubscriberWriteFailed(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, NewsError>;
