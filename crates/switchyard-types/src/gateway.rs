//! Gateway-facing DTOs: routing selection, status, health and rate-limit info.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A session's current routing choice. One per session; overwritten, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelection {
    pub provider_id: String,
    pub model_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of a lightweight connectivity probe.
///
/// `can_connect` is advisory: a provider can be administratively inactive
/// regardless of what the probe says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub id: String,
    pub is_active: bool,
    pub can_connect: bool,
    pub last_checked: DateTime<Utc>,
}

/// Outcome of a health check. Never an error: failures land in `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub provider_id: String,
    pub is_healthy: bool,
    pub details: serde_json::Value,
}

/// Derived, read-only view of a provider's rate window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub current_count: u32,
    pub reset_time: DateTime<Utc>,
}

/// Cache counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub in_flight: usize,
}
