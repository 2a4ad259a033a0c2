//! Response cache HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/cache/stats - Entry count, capacity and hit/miss counters
//! - DELETE /api/v1/cache       - Drop every cached response

use axum::extract::State;
use axum::Json;
use serde_json::json;

use switchyard_types::gateway::CacheStats;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /api/v1/cache/stats
pub async fn cache_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CacheStats>>, AppError> {
    let timer = RequestTimer::start();
    Ok(Json(timer.respond(state.gateway.cache().stats())))
}

/// DELETE /api/v1/cache
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = RequestTimer::start();
    let dropped = state.gateway.cache().len();
    state.gateway.cache().clear();
    tracing::info!(dropped, "Response cache cleared");
    Ok(Json(timer.respond(json!({ "cleared": dropped }))))
}
