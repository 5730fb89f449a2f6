// src/ingest/config.rs
//! Topic whitelist resolution.
//!
//! Lookup order: `$NEWS_TOPICS_PATH`, `config/news_topics.toml`,
//! `config/news_topics.json`, then [`DEFAULT_TOPICS`]. The resolved list
//! remembers where it came from so startup can log it.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const ENV_TOPICS_PATH: &str = "NEWS_TOPICS_PATH";
const TOML_FALLBACK: &str = "config/news_topics.toml";
const JSON_FALLBACK: &str = "config/news_topics.json";

/// Used when no topics file is configured or found.
pub const DEFAULT_TOPICS: &[&str] = &[
    "BTC", "ETH", "SOL", "XRP", "BNB", "ADA", "DOGE", "AVAX", "LINK", "DOT",
];

/// Where a whitelist was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicsSource {
    Env(PathBuf),
    File(PathBuf),
    BuiltIn,
}

impl fmt::Display for TopicsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicsSource::Env(p) => write!(f, "${ENV_TOPICS_PATH} ({})", p.display()),
            TopicsSource::File(p) => write!(f, "{}", p.display()),
            TopicsSource::BuiltIn => f.write_str("built-in defaults"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicList {
    /// Trimmed, upper-cased, deduplicated, sorted.
    pub topics: Vec<String>,
    pub source: TopicsSource,
}

impl TopicList {
    fn built_in() -> Self {
        Self {
            topics: canonical(DEFAULT_TOPICS.iter().copied()),
            source: TopicsSource::BuiltIn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    /// By extension; otherwise a leading `[` or `{` means JSON.
    fn detect(path: &Path, content: &str) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(e) if e.eq_ignore_ascii_case("toml") => Format::Toml,
            Some(e) if e.eq_ignore_ascii_case("json") => Format::Json,
            _ if content.trim_start().starts_with(['[', '{']) => Format::Json,
            _ => Format::Toml,
        }
    }
}

/// Accepted shapes: `topics = [...]` (TOML), `[...]` or `{"topics": [...]}` (JSON).
#[derive(Deserialize)]
#[serde(untagged)]
enum TopicsDoc {
    Bare(Vec<String>),
    Table { topics: Vec<String> },
}

impl TopicsDoc {
    fn into_list(self) -> Vec<String> {
        match self {
            TopicsDoc::Bare(v) | TopicsDoc::Table { topics: v } => v,
        }
    }
}

/// Read topic codes from `path`. An empty list after clean-up is an error:
/// the service would have nothing to serve per topic.
pub fn load_topics_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading topics from {}", path.display()))?;
    let doc: TopicsDoc = match Format::detect(path, &content) {
        Format::Toml => toml::from_str(&content)
            .with_context(|| format!("{} is not a TOML topics table", path.display()))?,
        Format::Json => serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON topics list", path.display()))?,
    };
    let topics = canonical(doc.into_list().iter().map(String::as_str));
    if topics.is_empty() {
        bail!("{} lists no topics", path.display());
    }
    Ok(topics)
}

/// Resolve the whitelist. A set but missing `$NEWS_TOPICS_PATH` is an error,
/// not a silent fallback.
pub fn load_topics_default() -> Result<TopicList> {
    if let Ok(p) = std::env::var(ENV_TOPICS_PATH) {
        let path = PathBuf::from(p);
        if !path.exists() {
            bail!("{ENV_TOPICS_PATH} points to non-existent path {}", path.display());
        }
        let topics = load_topics_from(&path)?;
        return Ok(TopicList {
            topics,
            source: TopicsSource::Env(path),
        });
    }

    for candidate in [TOML_FALLBACK, JSON_FALLBACK] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            let topics = load_topics_from(&path)?;
            return Ok(TopicList {
                topics,
                source: TopicsSource::File(path),
            });
        }
    }

    Ok(TopicList::built_in())
}

fn canonical<'a>(codes: impl Iterator<Item = &'a str>) -> Vec<String> {
    codes
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_ascii_uppercase)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
