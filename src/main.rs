//! News cache — binary entrypoint.
//! Loads configuration, starts the poll loop and serves the query/stream API.

use news_cache::config::FeedConfig;
use news_cache::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON lines with LOG_FORMAT=json. Filter from
/// RUST_LOG, else `news_cache=info,warn`.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_cache=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // The hosting runtime may already have installed a subscriber.
    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = FeedConfig::from_env()?;
    let metrics = Metrics::init(cfg.poll_interval_ms)?;

    // The poller lives as long as the process; the runtime owns shutdown.
    let (service, _poller) = news_cache::start(&cfg);

    let router = news_cache::router(service).merge(metrics.router());
    Ok(router.into())
}
