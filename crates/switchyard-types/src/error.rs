use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What kind of entity a [`GatewayError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Provider,
    Model,
    Conversation,
    Message,
    RateLimit,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Provider => write!(f, "provider"),
            ResourceKind::Model => write!(f, "model"),
            ResourceKind::Conversation => write!(f, "conversation"),
            ResourceKind::Message => write!(f, "message"),
            ResourceKind::RateLimit => write!(f, "rate limit policy"),
        }
    }
}

/// Discriminant of [`GatewayError`], for callers that branch on the kind of
/// failure without inspecting the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Inactive,
    ModelUnavailable,
    RateLimitExceeded,
    Provider,
    Timeout,
    Preload,
    Config,
}

/// Errors from the provider-mediation layer.
///
/// `Clone` so a single loader failure can be handed to every caller that was
/// waiting on the same in-flight computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Malformed input. Carries every violation found, in order.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("provider '{0}' is inactive")]
    Inactive(String),

    #[error("model '{model_id}' is not available on provider '{provider_id}'")]
    ModelUnavailable {
        provider_id: String,
        model_id: String,
    },

    #[error(
        "rate limit exceeded for '{provider_id}': {remaining}/{limit} remaining, resets in {reset_after_ms}ms"
    )]
    RateLimitExceeded {
        provider_id: String,
        limit: u32,
        remaining: u32,
        reset_after_ms: u64,
    },

    /// The outbound provider call failed (network, 5xx, malformed body).
    #[error("provider error: {0}")]
    Provider(String),

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    /// One or more entries of a cache preload batch failed.
    #[error("preload failed ({} failures): {}", .0.len(), .0.join("; "))]
    Preload(Vec<String>),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Shorthand for a single-message validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(vec![message.into()])
    }

    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        GatewayError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation(_) => ErrorKind::Validation,
            GatewayError::NotFound { .. } => ErrorKind::NotFound,
            GatewayError::Inactive(_) => ErrorKind::Inactive,
            GatewayError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            GatewayError::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            GatewayError::Provider(_) => ErrorKind::Provider,
            GatewayError::Timeout { .. } => ErrorKind::Timeout,
            GatewayError::Preload(_) => ErrorKind::Preload,
            GatewayError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether a caller may reasonably retry the same request later.
    ///
    /// The gateway never retries by itself; this is the hook for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimitExceeded { .. }
                | GatewayError::Provider(_)
                | GatewayError::Timeout { .. }
        )
    }
}
