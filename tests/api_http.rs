// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /news/latest
// - GET /news/topic/{topic}
// - GET /news/stream (first SSE frame)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use futures::StreamExt as _;
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use news_cache::ingest::normalize;
use news_cache::service::NewsService;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn seeded_service() -> Arc<NewsService> {
    let svc = NewsService::new(vec!["BTC".into(), "ETH".into()], Duration::from_millis(120_000));
    svc.apply(vec![
        normalize(&json!({ "id": "1", "published_on": 1000, "categories": "BTC", "title": "one" })).unwrap(),
        normalize(&json!({ "id": "2", "published_on": 2000, "categories": "BTC|ETH", "title": "two" })).unwrap(),
    ]);
    svc.record_success();
    Arc::new(svc)
}

fn test_router() -> Router {
    news_cache::router(seeded_service())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("parse json"))
}

#[tokio::test]
async fn health_reports_cache_state() {
    let (status, v) = get_json(test_router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ok"], true);
    assert_eq!(v["cachedCount"], 2);
    assert_eq!(v["pollIntervalMs"], 120_000);
    assert!(v["lastFetchAt"].is_string());
    assert!(v["lastError"].is_null());
}

#[tokio::test]
async fn latest_returns_newest_first() {
    let (status, v) = get_json(test_router(), "/news/latest?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["count"], 2);
    let ids: Vec<&str> = v["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|it| it["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["2", "1"]);
}

#[tokio::test]
async fn latest_limit_is_clamped_and_defaulted() {
    let (_, v) = get_json(test_router(), "/news/latest?limit=0").await;
    assert_eq!(v["count"], 1);
    let (_, v) = get_json(test_router(), "/news/latest?limit=abc").await;
    assert_eq!(v["count"], 2);
}

#[tokio::test]
async fn topic_accepts_ticker_form() {
    let (status, v) = get_json(test_router(), "/news/topic/ethusdt?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["topic"], "ETH");
    assert_eq!(v["count"], 1);
    assert_eq!(v["items"][0]["id"], "2");
}

#[tokio::test]
async fn unsupported_topic_is_a_client_error() {
    let (status, v) = get_json(test_router(), "/news/topic/DOGEFOO").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["topic"], "DOGEFOO");
    assert_eq!(v["supported"], json!(["BTC", "ETH"]));
}

#[tokio::test]
async fn stream_starts_with_snapshot_event() {
    let svc = seeded_service();
    let app = news_cache::router(svc.clone());

    let req = Request::builder()
        .method("GET")
        .uri("/news/stream")
        .body(Body::empty())
        .expect("build GET /news/stream");
    let resp = app.oneshot(req).await.expect("oneshot /news/stream");
    assert_eq!(resp.status(), StatusCode::OK);
    let ctype = resp
        .headers()
        .get("content-type")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert!(ctype.starts_with("text/event-stream"), "got {ctype}");
    assert_eq!(svc.subscriber_count(), 1);

    let mut body = resp.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("first chunk in time")
        .expect("stream not empty")
        .expect("chunk ok");
    let text = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(text.contains("event: snapshot"), "{text}");
    assert!(text.contains(r#""type":"snapshot""#), "{text}");

    // client goes away → subscription removed
    drop(body);
    assert_eq!(svc.subscriber_count(), 0);
}
