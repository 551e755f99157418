//! HTTP handlers
//!
//! `POST /calcular` runs a match for the posted address, `GET /health`
//! answers liveness probes, and everything else falls through to the
//! static frontend when one is configured.

mod calculate;
mod health;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::matching::MatchEngine;

pub use calculate::handle_calculate;
pub use health::handle_health;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
}

impl AppState {
    pub fn new(engine: MatchEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Build the application router
pub fn build_app(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/calcular", post(handle_calculate))
        .route("/health", get(handle_health))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}
