//! Provider catalog HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/providers                         - List providers (`?active=true` filters)
//! - POST   /api/v1/providers                         - Register a provider
//! - GET    /api/v1/providers/health                  - Health of every provider
//! - GET    /api/v1/providers/{id}                    - Get a provider
//! - POST   /api/v1/providers/{id}/activate           - Mark active
//! - POST   /api/v1/providers/{id}/deactivate         - Mark inactive
//! - GET    /api/v1/providers/{id}/status             - Probe connectivity
//! - GET    /api/v1/providers/{id}/health             - Health report
//! - GET    /api/v1/providers/{id}/rate-limit         - Current rate window
//! - POST   /api/v1/providers/{id}/models             - Add a model
//! - DELETE /api/v1/providers/{id}/models/{model_id}  - Remove a model

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use switchyard_types::error::{GatewayError, ResourceKind};
use switchyard_types::gateway::{HealthReport, ProviderStatus, RateLimitInfo};
use switchyard_types::provider::{ModelDescriptor, Provider, ProviderConfig};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProviderListQuery {
    #[serde(default)]
    pub active: bool,
}

/// Result of a model add/remove: whether the catalog changed.
#[derive(Debug, Serialize)]
pub struct ModelChange {
    pub provider_id: String,
    pub model_id: String,
    pub changed: bool,
}

/// Rate window of a provider. `info` is null when the provider has no policy.
#[derive(Debug, Serialize)]
pub struct RateLimitView {
    pub provider_id: String,
    pub info: Option<RateLimitInfo>,
}

/// GET /api/v1/providers
pub async fn list_providers(
    State(state): State<AppState>,
    Query(query): Query<ProviderListQuery>,
) -> Result<Json<ApiResponse<Vec<Provider>>>, AppError> {
    let timer = RequestTimer::start();
    let registry = state.gateway.registry();
    let providers = if query.active {
        registry.list_active()
    } else {
        registry.list_all()
    };
    Ok(Json(
        timer
            .respond(providers)
            .with_link("self", "/api/v1/providers")
            .with_link("health", "/api/v1/providers/health"),
    ))
}

/// POST /api/v1/providers
pub async fn register_provider(
    State(state): State<AppState>,
    Json(config): Json<ProviderConfig>,
) -> Result<Json<ApiResponse<Provider>>, AppError> {
    let timer = RequestTimer::start();
    let provider = state.gateway.register_provider(&config)?;
    let href = format!("/api/v1/providers/{}", provider.id);
    Ok(Json(timer.respond(provider).with_link("self", &href)))
}

/// GET /api/v1/providers/{id}
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Provider>>, AppError> {
    let timer = RequestTimer::start();
    let provider = state
        .gateway
        .registry()
        .get(&id)
        .ok_or_else(|| GatewayError::not_found(ResourceKind::Provider, &id))?;
    Ok(Json(
        timer
            .respond(provider)
            .with_link("self", &format!("/api/v1/providers/{id}"))
            .with_link("status", &format!("/api/v1/providers/{id}/status"))
            .with_link("rate_limit", &format!("/api/v1/providers/{id}/rate-limit")),
    ))
}

/// POST /api/v1/providers/{id}/activate
pub async fn activate_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Provider>>, AppError> {
    let timer = RequestTimer::start();
    let provider = state.gateway.registry().activate(&id)?;
    Ok(Json(
        timer
            .respond(provider)
            .with_link("self", &format!("/api/v1/providers/{id}")),
    ))
}

/// POST /api/v1/providers/{id}/deactivate
pub async fn deactivate_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Provider>>, AppError> {
    let timer = RequestTimer::start();
    let provider = state.gateway.registry().deactivate(&id)?;
    Ok(Json(
        timer
            .respond(provider)
            .with_link("self", &format!("/api/v1/providers/{id}")),
    ))
}

/// GET /api/v1/providers/{id}/status
///
/// Probe failures and timeouts are errors here; use `/health` for a report
/// that always succeeds.
pub async fn provider_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProviderStatus>>, AppError> {
    let timer = RequestTimer::start();
    let status = state.gateway.status(&id).await?;
    Ok(Json(timer.respond(status)))
}

/// GET /api/v1/providers/{id}/health
pub async fn provider_health(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<HealthReport>>, AppError> {
    let timer = RequestTimer::start();
    let report = state.gateway.health_check(&id).await;
    Ok(Json(timer.respond(report)))
}

/// GET /api/v1/providers/health
pub async fn all_provider_health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<HealthReport>>>, AppError> {
    let timer = RequestTimer::start();
    let reports = state.gateway.health_check_all().await;
    Ok(Json(timer.respond(reports)))
}

/// GET /api/v1/providers/{id}/rate-limit
pub async fn provider_rate_limit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RateLimitView>>, AppError> {
    let timer = RequestTimer::start();
    let info = state.gateway.rate_limit_info(&id)?;
    Ok(Json(timer.respond(RateLimitView {
        provider_id: id,
        info,
    })))
}

/// POST /api/v1/providers/{id}/models
pub async fn add_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(model): Json<ModelDescriptor>,
) -> Result<Json<ApiResponse<ModelChange>>, AppError> {
    let timer = RequestTimer::start();
    let model_id = model.id.clone();
    let changed = state.gateway.registry().add_model(&id, model)?;
    Ok(Json(timer.respond(ModelChange {
        provider_id: id,
        model_id,
        changed,
    })))
}

/// DELETE /api/v1/providers/{id}/models/{model_id}
pub async fn remove_model(
    State(state): State<AppState>,
    Path((id, model_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ModelChange>>, AppError> {
    let timer = RequestTimer::start();
    let changed = state.gateway.registry().remove_model(&id, &model_id)?;
    Ok(Json(timer.respond(ModelChange {
        provider_id: id,
        model_id,
        changed,
    })))
}
