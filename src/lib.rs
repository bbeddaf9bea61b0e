// src/lib.rs
// Public library surface for the service binary, the demo, and integration tests.

pub mod api;
pub mod background;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod prefs;
pub mod realtime;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::feed::{FeedItem, FeedKind, FeedVariant, FeedView, LiveFeed};
pub use crate::realtime::{subscribe, RetryPolicy, Subscription};

use std::sync::Arc;
use tracing::info;

use crate::config::FeedConfig;
use crate::store::{memory::MemoryStore, rest::RestStore, RowStore};

/// Pick the row store the config asks for: hosted backend if a URL is set,
/// otherwise an empty in-process store (the feeds then show their samples).
pub fn store_from_config(cfg: &FeedConfig) -> Arc<dyn RowStore> {
    match &cfg.store_url {
        Some(url) => {
            info!(%url, "using hosted row store");
            Arc::new(RestStore::new(url.clone(), cfg.api_key.clone()).with_poll_interval(cfg.poll_interval()))
        }
        None => {
            info!("no store_url configured; using in-process store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Mount both feed variants and, if the viewport allows, the background loop.
/// Must be called inside a Tokio runtime.
pub fn mount_app(store: Arc<dyn RowStore>, cfg: &FeedConfig) -> AppState {
    let policy = cfg.retry_policy();
    let compact = Arc::new(LiveFeed::mount(store.clone(), FeedVariant::Compact, policy));
    let live = Arc::new(LiveFeed::mount(store, FeedVariant::Live, policy));

    let background = match cfg.viewport() {
        Some(vp) => Some(Arc::new(background::spawn_background(
            cfg.scene(),
            vp,
            cfg.frame_interval(),
            None,
        ))),
        None => {
            tracing::debug!("viewport has no area; background disabled");
            None
        }
    };

    AppState {
        compact,
        live,
        background,
    }
}
