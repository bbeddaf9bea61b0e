use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::background::BackgroundHandle;
use crate::feed::{FeedFilter, FeedVariant, FeedView, FilterParams, LiveFeed, REGIONS};

#[derive(Clone)]
pub struct AppState {
    pub compact: Arc<LiveFeed>,
    pub live: Arc<LiveFeed>,
    pub background: Option<Arc<BackgroundHandle>>,
}

impl AppState {
    fn feed(&self, variant: FeedVariant) -> &LiveFeed {
        match variant {
            FeedVariant::Compact => &self.compact,
            FeedVariant::Live => &self.live,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/feed/regions", get(regions))
        .route("/feed/{variant}", get(feed))
        .route("/background/frame.svg", get(background_frame))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Alias kept for callers that build the router by its short name.
pub fn router(state: AppState) -> Router {
    create_router(state)
}

async fn regions() -> Json<&'static [&'static str]> {
    Json(REGIONS)
}

async fn feed(
    State(state): State<AppState>,
    Path(variant): Path<String>,
    Query(params): Query<FilterParams>,
) -> Result<Json<FeedView>, (StatusCode, String)> {
    let variant = FeedVariant::parse(&variant)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown feed {variant:?}")))?;
    let feed = state.feed(variant);

    if !variant.supports_filters() {
        return Ok(Json(feed.view()));
    }
    let filter =
        FeedFilter::from_params(&params).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    Ok(Json(feed.filtered_view_at(&filter, chrono::Utc::now())))
}

async fn background_frame(State(state): State<AppState>) -> Response {
    match &state.background {
        Some(bg) => {
            let frame = bg.latest();
            (
                [(header::CONTENT_TYPE, "image/svg+xml")],
                frame.svg.as_ref().clone(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "background disabled").into_response(),
    }
}
