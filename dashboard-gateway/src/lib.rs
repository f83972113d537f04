//! Dashboard gateway — JSON API for the soil-probe dashboard front end.
//!
//! Fetches raw records from the backend API through a [`DataSource`], runs
//! them through the `probe-core` classification and alignment layer and
//! returns chart- and map-ready JSON.

pub mod config;
pub mod handlers;
pub mod models;

use std::sync::Arc;

use axum::{routing::get, Router};
use chrono::{DateTime, Local};
use probe_core::source::DataSource;
use tower_http::trace::TraceLayer;

// ------------------------------------------------------------------ //
//  Shared application state                                           //
// ------------------------------------------------------------------ //

/// Shared state injected into every Axum handler via `State`.
pub struct AppState {
    /// Backend API client.
    pub source: Arc<dyn DataSource>,
    /// Maximum number of devices requested for the attention feed.
    pub attention_limit: u32,
    /// Wall clock, read once per request.
    pub clock: fn() -> DateTime<Local>,
}

impl AppState {
    pub fn new(source: Arc<dyn DataSource>, attention_limit: u32) -> Self {
        Self {
            source,
            attention_limit,
            clock: Local::now,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/dashboard/range", get(handlers::range))
        .route("/dashboard/summary", get(handlers::summary))
        .route("/dashboard/attention", get(handlers::attention))
        .route("/dashboard/moisture", get(handlers::moisture))
        .route("/dashboard/temperature", get(handlers::temperature))
        .route("/dashboard/farms", get(handlers::farms))
        .route("/dashboard/farms/:id", get(handlers::farm_detail))
        .route("/dashboard/devices", get(handlers::devices))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
