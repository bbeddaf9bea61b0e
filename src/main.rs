//! JeevaDhara live feed service: binary entrypoint.
//! Boots the Axum HTTP server with the mounted feeds and background loop.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jeevadhara_live::config::FeedConfig;
use jeevadhara_live::metrics::Metrics;
use jeevadhara_live::{create_router, mount_app, store_from_config};

/// Enable compact tracing logs in development.
/// Activation requires debug build OR FEED_DEV_LOG=1.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FEED_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    if !(dev_flag || cfg!(debug_assertions)) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jeevadhara_live=info,warn"));

    // The deployment runtime may already own the global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = FeedConfig::load_default().context("loading feed config")?;
    let store = store_from_config(&cfg);
    let state = mount_app(store, &cfg);

    let mut router = create_router(state);
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
