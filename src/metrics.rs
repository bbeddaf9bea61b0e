use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the feed/background series.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(
        "feed_initial_rows_total",
        "Rows returned by initial bulk reads."
    );
    describe_counter!(
        "feed_source_errors_total",
        "Initial reads that failed and were treated as empty."
    );
    describe_counter!(
        "feed_rejected_rows_total",
        "Rows rejected by the validating decode."
    );
    describe_counter!(
        "feed_realtime_items_total",
        "Items received from change subscriptions."
    );
    describe_counter!("feed_evicted_total", "Items evicted from the feed tail.");
    describe_counter!(
        "feed_subscription_retries_total",
        "Subscription reconnect attempts."
    );
    describe_counter!("feed_poll_errors_total", "Failed change polls (REST store).");
    describe_counter!("background_frames_total", "Background frames rendered.");
    describe_gauge!("feed_items", "Items currently held per feed variant.");
}
