use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use futures::stream::{self, Stream};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::broadcast::StreamEvent;
use crate::error::NewsError;
use crate::service::{Health, LatestResponse, NewsService, MAX_LIMIT};

#[derive(Clone)]
pub struct AppState {
    news: Arc<NewsService>,
}

pub fn router(news: Arc<NewsService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/news/latest", get(latest))
        .route("/news/topic/{topic}", get(by_topic))
        .route("/news/stream", get(stream_news))
        .layer(CorsLayer::very_permissive())
        .with_state(AppState { news })
}

// Missing or unparseable `limit` falls back to the maximum.
fn limit_param(q: &HashMap<String, String>) -> usize {
    q.get("limit")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(MAX_LIMIT)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(state.news.health())
}

async fn latest(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<LatestResponse> {
    Json(state.news.latest(limit_param(&q)))
}

async fn by_topic(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    match state.news.by_topic(&topic, limit_param(&q)) {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: NewsError) -> Response {
    match err {
        NewsError::UnsupportedTopic { topic, supported } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "unsupported topic",
                "topic": topic,
                "supported": supported,
            })),
        )
            .into_response(),
        NewsError::UnknownTopic(topic) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unknown topic", "topic": topic })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": other.to_string() })),
        )
            .into_response(),
    }
}

fn to_sse(ev: &StreamEvent) -> Event {
    Event::default()
        .event(ev.kind())
        .json_data(ev)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

/// Server-sent events: a `snapshot`, then `new` events as the cache grows.
/// The subscription is dropped (and unsubscribed) when the client goes away.
async fn stream_news(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let sub = state.news.subscribe();
    let events = stream::unfold(sub, |mut sub| async move {
        let ev = sub.recv().await?;
        Some((Ok(to_sse(&ev)), sub))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
