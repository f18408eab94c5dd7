//! API router. Returns a composable `Router` mounted on the analysis
//! engine; the binary serves it, tests can call the handlers directly.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::pipeline::AnalysisEngine;

pub fn api_router(engine: Arc<AnalysisEngine>) -> Router {
    Router::new()
        .route("/api/health", get(endpoints::health))
        .route("/api/interactions/analyze", post(endpoints::analyze))
        .with_state(engine)
}
