//! leadfill-enrich library interface
//!
//! Contact enrichment for real-estate CSV uploads: each row is resolved to
//! an agent email/phone through an ordered list of upstream lookups, and the
//! enriched CSV is offered for download.

pub mod api;
pub mod batch;
pub mod config;
pub mod csv_io;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod resolver;
pub mod services;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::EnrichConfig;
use crate::resolver::ResolutionPolicy;
use crate::storage::OutputStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded service configuration
    pub config: Arc<EnrichConfig>,
    /// Resolution policy; its strategies hold the per-host rate limiters
    pub policy: Arc<ResolutionPolicy>,
    /// Enriched files awaiting download
    pub outputs: OutputStore,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last server-side error for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: EnrichConfig, policy: ResolutionPolicy) -> Self {
        let outputs = OutputStore::new(
            config.output_dir.clone(),
            Duration::from_secs(config.output_ttl_secs),
        );
        Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
            outputs,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::enrich_routes())
        .merge(api::download_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
