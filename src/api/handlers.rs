use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;

use super::protocol::{HealthResponse, StatsResponse};
use crate::pipeline::IngestionPipeline;

pub async fn handle_health(
    Extension(pipeline): Extension<Arc<IngestionPipeline>>,
) -> (StatusCode, Json<HealthResponse>) {
    if pipeline.is_accepting() {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                accepting: true,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "shutting_down".to_string(),
                accepting: false,
            }),
        )
    }
}

/// Reads the counters without resetting them, so it never disturbs the periodic reporter.
pub async fn handle_stats(
    Extension(pipeline): Extension<Arc<IngestionPipeline>>,
) -> Json<StatsResponse> {
    let config = pipeline.config();

    Json(StatsResponse {
        counters: pipeline.stats().snapshot(),
        primary_depth: pipeline.primary_len(),
        primary_capacity: config.primary_capacity,
        overflow_depth: pipeline.overflow_len(),
        overflow_capacity: config.overflow_capacity,
        workers: config.workers,
    })
}
