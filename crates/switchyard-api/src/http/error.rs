//! Application error type mapping to HTTP status codes and envelope format.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use switchyard_types::error::GatewayError;

use crate::http::response::{ApiErrorDetail, ApiMeta, ApiResponse};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Gateway(GatewayError),
    /// Malformed request input caught before reaching the gateway.
    Validation(String),
    /// A lookup outside the gateway's own resources came up empty.
    NotFound(String),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::Gateway(e)
    }
}

impl AppError {
    /// Status, machine-readable code, message and optional details.
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Gateway(e) => {
                let (status, code) = gateway_status(e);
                (status, code, e.to_string(), gateway_details(e))
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
        }
    }
}

fn gateway_status(e: &GatewayError) -> (StatusCode, &'static str) {
    match e {
        GatewayError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        GatewayError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        GatewayError::Inactive(_) => (StatusCode::CONFLICT, "PROVIDER_INACTIVE"),
        GatewayError::ModelUnavailable { .. } => (StatusCode::CONFLICT, "MODEL_UNAVAILABLE"),
        GatewayError::RateLimitExceeded { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
        }
        GatewayError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
        GatewayError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
        GatewayError::Preload(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PRELOAD_ERROR"),
        GatewayError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
    }
}

fn gateway_details(e: &GatewayError) -> Option<serde_json::Value> {
    match e {
        GatewayError::Validation(violations) if violations.len() > 1 => {
            Some(json!({ "violations": violations }))
        }
        GatewayError::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
        GatewayError::RateLimitExceeded {
            provider_id,
            limit,
            remaining,
            reset_after_ms,
        } => Some(json!({
            "provider_id": provider_id,
            "limit": limit,
            "remaining": remaining,
            "reset_after_ms": reset_after_ms,
        })),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        } else {
            tracing::debug!(code, %message, "Request rejected");
        }

        let envelope = ApiResponse::<()> {
            data: None,
            meta: ApiMeta::new(String::new(), 0),
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message,
                details,
            }],
            links: BTreeMap::new(),
        };

        let body = serde_json::to_string(&envelope).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#
                .to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
