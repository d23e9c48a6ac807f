//! HTTP Status Module
//!
//! A small read-only HTTP surface for operators and orchestrators.
//!
//! ## Endpoints
//! - `GET /health`: Liveness. `200` while the pipeline accepts events, `503` once
//!   it is shutting down.
//! - `GET /stats`: Current counters and queue depths as JSON.

pub mod handlers;
pub mod protocol;

use crate::pipeline::IngestionPipeline;

use axum::{extract::Extension, routing::get, Router};
use std::sync::Arc;

pub fn router(pipeline: Arc<IngestionPipeline>) -> Router {
    Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/stats", get(handlers::handle_stats))
        .layer(Extension(pipeline))
}
