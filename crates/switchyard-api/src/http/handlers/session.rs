//! Per-session routing selection HTTP handlers.
//!
//! Endpoints:
//! - PUT /api/v1/sessions/{id}/selection - Select provider (and model)
//! - GET /api/v1/sessions/{id}/selection - Current selection

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use switchyard_types::gateway::ProviderSelection;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectProviderRequest {
    pub provider_id: String,
    /// Defaults to the provider's first model.
    #[serde(default)]
    pub model_id: Option<String>,
}

/// PUT /api/v1/sessions/{id}/selection
pub async fn select_provider(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<SelectProviderRequest>,
) -> Result<Json<ApiResponse<ProviderSelection>>, AppError> {
    let timer = RequestTimer::start();
    let selection =
        state
            .gateway
            .select_provider(&session_id, &body.provider_id, body.model_id.as_deref())?;
    Ok(Json(timer.respond(selection).with_link(
        "self",
        &format!("/api/v1/sessions/{session_id}/selection"),
    )))
}

/// GET /api/v1/sessions/{id}/selection
pub async fn get_selection(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<ProviderSelection>>, AppError> {
    let timer = RequestTimer::start();
    let selection = state.gateway.selection(&session_id).ok_or_else(|| {
        AppError::NotFound(format!("session '{session_id}' has no provider selected"))
    })?;
    Ok(Json(timer.respond(selection)))
}
