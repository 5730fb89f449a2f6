// tests/ingest_normalize.rs
use news_cache::error::NewsError;
use news_cache::ingest::{normalize, TRUNCATION_MARKER};
use serde_json::json;

fn feed_record() -> serde_json::Value {
    json!({
        "id": "7654321",
        "guid": "https://example.com/?p=1",
        "published_on": 1_700_000_000,
        "imageurl": "https://images.example.com/btc.png",
        "title": "Bitcoin climbs past resistance",
        "url": "https://www.coindesk.com/markets/2023/11/14/bitcoin-climbs",
        "body": "Bitcoin rose on Tuesday.",
        "tags": "Markets|Price",
        "lang": "EN",
        "upvotes": "3",
        "downvotes": "0",
        "categories": "BTC|Market|Trading",
        "source_info": { "name": "CoinDesk", "img": "https://images.example.com/coindesk.png", "lang": "EN" },
        "source": "coindesk"
    })
}

#[test]
fn full_record_maps_every_field() {
    let raw = feed_record();
    let it = normalize(&raw).unwrap();

    assert_eq!(it.id, "7654321");
    assert_eq!(it.title, "Bitcoin climbs past resistance");
    assert_eq!(it.description, "Bitcoin rose on Tuesday.");
    assert_eq!(it.published_at.timestamp_millis(), 1_700_000_000_000);
    assert_eq!(it.created_at, it.published_at);
    assert_eq!(it.domain, "coindesk.com");
    assert_eq!(it.source.title, "CoinDesk");
    assert_eq!(it.source.domain, "coindesk.com");
    assert_eq!(it.source.icon.as_deref(), Some("https://images.example.com/coindesk.png"));
    assert_eq!(it.categories, vec!["BTC", "Market", "Trading"]);
    assert_eq!(it.thumbnail.as_deref(), Some("https://images.example.com/btc.png"));
    assert_eq!(it.tags, json!("Markets|Price"));
    assert_eq!(it.score.up, 3);
    assert_eq!(it.score.down, 0);
    assert_eq!(it.raw, raw);
}

#[test]
fn contract_field_names_are_accepted() {
    let it = normalize(&json!({
        "id": "c1",
        "publishedAtEpochSeconds": 2_000,
        "sourceName": "feedname",
        "sourceInfo": { "name": "Feed", "icon": "icon.png" },
        "imageUrl": "thumb.png",
        "categories": "ETH"
    }))
    .unwrap();
    assert_eq!(it.published_at.timestamp(), 2_000);
    assert_eq!(it.source.title, "Feed");
    assert_eq!(it.source.icon.as_deref(), Some("icon.png"));
    assert_eq!(it.thumbnail.as_deref(), Some("thumb.png"));
}

#[test]
fn missing_id_is_malformed() {
    for raw in [json!({ "title": "no id" }), json!({ "id": "" }), json!({ "id": null })] {
        assert!(matches!(normalize(&raw), Err(NewsError::MalformedItem(_))), "{raw}");
    }
}

#[test]
fn absent_optional_fields_get_defaults() {
    let it = normalize(&json!({ "id": "bare" })).unwrap();
    assert_eq!(it.description, "");
    assert!(it.categories.is_empty());
    assert!(it.thumbnail.is_none());
    assert_eq!(it.score.up, 0);
    assert_eq!(it.score.down, 0);
    // missing publish time sorts as the epoch
    assert_eq!(it.published_at.timestamp(), 0);
    assert!(it.tags.is_null());
}

#[test]
fn long_body_is_truncated_with_marker() {
    let body = "a".repeat(450);
    let it = normalize(&json!({ "id": "long", "body": body })).unwrap();
    assert_eq!(it.description.chars().count(), 300 + TRUNCATION_MARKER.chars().count());
    assert!(it.description.starts_with(&"a".repeat(300)));
    assert!(it.description.ends_with(TRUNCATION_MARKER));
}

#[test]
fn category_case_is_preserved() {
    let it = normalize(&json!({ "id": "c", "categories": "btc|Eth" })).unwrap();
    assert_eq!(it.categories, vec!["btc", "Eth"]);
}

#[test]
fn mistyped_fields_do_not_drop_a_record_with_an_id() {
    let it = normalize(&json!({ "id": "1", "title": 123 })).unwrap();
    assert_eq!(it.id, "1");
    assert_eq!(it.title, "");

    let it = normalize(&json!({ "id": "2", "categories": ["BTC"], "published_on": 50 })).unwrap();
    assert!(it.categories.is_empty());
    assert_eq!(it.published_at.timestamp(), 50);

    let it = normalize(&json!({ "id": "3", "sourceInfo": "x", "source": "fallback" })).unwrap();
    assert_eq!(it.source.title, "fallback");
    assert!(it.source.icon.is_none());

    let it = normalize(&json!({ "id": "4", "body": { "a": 1 }, "url": false, "imageurl": 9 })).unwrap();
    assert_eq!(it.description, "");
    assert_eq!(it.url, "");
    assert!(it.thumbnail.is_none());

    let it = normalize(&json!({ "id": "5", "source_info": { "name": 7, "img": "i.png" } })).unwrap();
    assert_eq!(it.source.title, "");
    assert_eq!(it.source.icon.as_deref(), Some("i.png"));
}

#[test]
fn non_object_records_are_malformed() {
    for raw in [json!(42), json!("text"), json!([{ "id": "1" }]), json!(null)] {
        assert!(matches!(normalize(&raw), Err(NewsError::MalformedItem(_))), "{raw}");
    }
}

#[test]
fn category_codes_are_kept_verbatim() {
    let it = normalize(&json!({ "id": "v", "categories": "BTC| ETH " })).unwrap();
    assert_eq!(it.categories, vec!["BTC", " ETH "]);
}
