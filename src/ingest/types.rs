// src/ingest/types.rs
use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// One raw provider record, decoded leniently. Field names follow the
/// upstream feed; the camel-case aliases cover the documented contract.
///
/// Only a non-object record fails to decode. A field of the wrong type
/// decodes as absent, so a record with a usable id is never lost to a bad
/// display field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNewsItem {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(alias = "publishedAtEpochSeconds", deserialize_with = "lenient_i64")]
    pub published_on: Option<i64>,
    #[serde(alias = "sourceName", deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(alias = "sourceInfo", deserialize_with = "lenient_source_info")]
    pub source_info: Option<RawSourceInfo>,
    #[serde(deserialize_with = "lenient_string")]
    pub categories: Option<String>,
    #[serde(alias = "imageUrl", deserialize_with = "lenient_string")]
    pub imageurl: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub body: Option<String>,
    pub tags: serde_json::Value,
    #[serde(deserialize_with = "lenient_u64")]
    pub upvotes: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub downvotes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSourceInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(alias = "icon", deserialize_with = "lenient_string")]
    pub img: Option<String>,
}

/// Upstream news source. One call returns one batch of raw records covering
/// every requested topic.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_batch(&self, topics: &[String]) -> Result<Vec<serde_json::Value>>;
    fn name(&self) -> &'static str;
}

// The feed sends counters and ids as numbers or as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl NumOrText {
    fn as_i64(&self) -> Option<i64> {
        match self {
            NumOrText::Int(n) => Some(*n),
            NumOrText::Float(f) if f.is_finite() => Some(*f as i64),
            NumOrText::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    let v: Option<NumOrText> = Option::deserialize(d)?;
    Ok(v.and_then(|v| v.as_i64()))
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u64>, D::Error> {
    let v: Option<NumOrText> = Option::deserialize(d)?;
    Ok(v.and_then(|v| v.as_i64()).map(|n| n.max(0) as u64))
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let v: Option<NumOrText> = Option::deserialize(d)?;
    let id = match v {
        Some(NumOrText::Text(s)) => s.trim().to_string(),
        Some(NumOrText::Int(n)) => n.to_string(),
        _ => return Ok(None),
    };
    Ok(Some(id).filter(|s| !s.is_empty()))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    let v: Option<serde_json::Value> = Option::deserialize(d)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_source_info<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<RawSourceInfo>, D::Error> {
    let v: Option<serde_json::Value> = Option::deserialize(d)?;
    Ok(v.filter(serde_json::Value::is_object)
        .and_then(|v| RawSourceInfo::deserialize(v).ok()))
}
