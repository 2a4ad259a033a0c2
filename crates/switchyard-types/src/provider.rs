//! Provider catalog types.
//!
//! [`ProviderConfig`] is the raw shape read from the catalog source (strings
//! and signed integers, exactly as a human wrote them). It is validated once
//! by [`validate_provider_config`] and converted into a typed [`Provider`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;

/// Commercial tier of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTier {
    Free,
    Paid,
    Enterprise,
}

impl fmt::Display for ProviderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderTier::Free => write!(f, "free"),
            ProviderTier::Paid => write!(f, "paid"),
            ProviderTier::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl FromStr for ProviderTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(ProviderTier::Free),
            "paid" => Ok(ProviderTier::Paid),
            "enterprise" => Ok(ProviderTier::Enterprise),
            other => Err(format!(
                "invalid tier: '{other}' (expected free, paid or enterprise)"
            )),
        }
    }
}

/// A model offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    /// Free-form capability tags (e.g. "chat", "vision", "tools").
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }
}

/// Sliding-window rate-limit policy for a provider.
///
/// Only `max_requests` per `window_ms` is enforced. The daily and
/// per-minute token figures are carried for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_minute: Option<u32>,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
            requests_per_day: None,
            tokens_per_minute: None,
        }
    }
}

/// A validated provider in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub endpoint: Url,
    /// Ordered model catalog; the first entry is the default model.
    pub models: Vec<ModelDescriptor>,
    pub rate_limit: Option<RateLimitPolicy>,
    pub tier: ProviderTier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// Validate a raw config and convert it into a typed provider.
    ///
    /// Every violation is reported, not just the first.
    pub fn from_config(config: &ProviderConfig, now: DateTime<Utc>) -> Result<Self, GatewayError> {
        let errors = validate_provider_config(config);
        if !errors.is_empty() {
            return Err(GatewayError::Validation(errors));
        }

        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| GatewayError::validation(format!("endpoint: {e}")))?;
        let tier = config
            .tier
            .parse::<ProviderTier>()
            .map_err(GatewayError::validation)?;

        // Non-negative values were checked above, so these casts cannot wrap.
        let rate_limit = config.rate_limit.as_ref().map(|rl| RateLimitPolicy {
            max_requests: rl.max_requests.min(u32::MAX as i64) as u32,
            window_ms: rl.window_ms as u64,
            requests_per_day: rl.requests_per_day.map(|v| v.min(u32::MAX as i64) as u32),
            tokens_per_minute: rl.tokens_per_minute.map(|v| v.min(u32::MAX as i64) as u32),
        });

        Ok(Self {
            id: config.id.trim().to_string(),
            name: config.name.trim().to_string(),
            endpoint,
            models: config.models.clone(),
            rate_limit,
            tier,
            is_active: config.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Look up a model by id.
    pub fn model(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// The first model in the catalog, if any.
    pub fn default_model(&self) -> Option<&ModelDescriptor> {
        self.models.first()
    }
}

/// Raw provider entry as found in the catalog source (`[[providers]]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default = "default_tier")]
    pub tier: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_tier() -> String {
    "free".to_string()
}

fn default_is_active() -> bool {
    true
}

/// Raw rate-limit block. Signed so that negative values written by a human
/// surface as validation messages instead of parse failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: i64,
    pub window_ms: i64,
    #[serde(default)]
    pub requests_per_day: Option<i64>,
    #[serde(default)]
    pub tokens_per_minute: Option<i64>,
}

/// Check a raw provider config and return every violation in order.
///
/// An empty vector means the config is valid.
pub fn validate_provider_config(config: &ProviderConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.id.trim().is_empty() {
        errors.push("id must be a non-empty string".to_string());
    }
    if config.name.trim().is_empty() {
        errors.push("name must be a non-empty string".to_string());
    }
    if let Err(e) = Url::parse(&config.endpoint) {
        errors.push(format!("endpoint '{}' is not a valid URL: {e}", config.endpoint));
    }

    if let Some(rl) = &config.rate_limit {
        if rl.max_requests < 0 {
            errors.push("rate_limit.max_requests must be non-negative".to_string());
        }
        if rl.window_ms < 0 {
            errors.push("rate_limit.window_ms must be non-negative".to_string());
        }
        if rl.requests_per_day.is_some_and(|v| v < 0) {
            errors.push("rate_limit.requests_per_day must be non-negative".to_string());
        }
        if rl.tokens_per_minute.is_some_and(|v| v < 0) {
            errors.push("rate_limit.tokens_per_minute must be non-negative".to_string());
        }
    }

    if let Err(e) = config.tier.parse::<ProviderTier>() {
        errors.push(e);
    }

    let mut seen = BTreeSet::new();
    for (idx, model) in config.models.iter().enumerate() {
        if model.id.trim().is_empty() {
            errors.push(format!("models[{idx}].id must be a non-empty string"));
        } else if !seen.insert(model.id.as_str()) {
            errors.push(format!("models[{idx}].id '{}' is duplicated", model.id));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProviderConfig {
        ProviderConfig {
            id: "groq".to_string(),
            name: "Groq".to_string(),
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            models: vec![
                ModelDescriptor::new("llama3-70b").with_capability("chat"),
                ModelDescriptor::new("mixtral-8x7b"),
            ],
            rate_limit: Some(RateLimitConfig {
                max_requests: 30,
                window_ms: 60_000,
                requests_per_day: Some(14_400),
                tokens_per_minute: None,
            }),
            tier: "free".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_tier_roundtrip() {
        for tier in [ProviderTier::Free, ProviderTier::Paid, ProviderTier::Enterprise] {
            let parsed: ProviderTier = tier.to_string().parse().unwrap();
            assert_eq!(parsed, tier);
        }
        assert!("premium".parse::<ProviderTier>().is_err());
    }

    #[test]
    fn test_valid_config_has_no_errors() {
        assert!(validate_provider_config(&valid_config()).is_empty());
    }

    #[test]
    fn test_validation_collects_every_violation_in_order() {
        let mut config = valid_config();
        config.id = "  ".to_string();
        config.name = String::new();
        config.endpoint = "not a url".to_string();
        config.tier = "gold".to_string();
        config.rate_limit = Some(RateLimitConfig {
            max_requests: -1,
            window_ms: -5,
            requests_per_day: None,
            tokens_per_minute: Some(-10),
        });

        let errors = validate_provider_config(&config);
        assert_eq!(errors.len(), 7);
        assert!(errors[0].starts_with("id"));
        assert!(errors[1].starts_with("name"));
        assert!(errors[2].starts_with("endpoint"));
        assert!(errors[3].contains("max_requests"));
        assert!(errors[4].contains("window_ms"));
        assert!(errors[5].contains("tokens_per_minute"));
        assert!(errors[6].contains("gold"));
    }

    #[test]
    fn test_duplicate_model_ids_rejected() {
        let mut config = valid_config();
        config.models.push(ModelDescriptor::new("llama3-70b"));
        let errors = validate_provider_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("duplicated"));
    }

    #[test]
    fn test_from_config_builds_typed_provider() {
        let now = Utc::now();
        let provider = Provider::from_config(&valid_config(), now).unwrap();
        assert_eq!(provider.id, "groq");
        assert_eq!(provider.tier, ProviderTier::Free);
        assert_eq!(provider.endpoint.host_str(), Some("api.groq.com"));
        let rl = provider.rate_limit.unwrap();
        assert_eq!(rl.max_requests, 30);
        assert_eq!(rl.window_ms, 60_000);
        assert_eq!(rl.requests_per_day, Some(14_400));
        assert_eq!(provider.created_at, now);
        assert_eq!(provider.default_model().unwrap().id, "llama3-70b");
        assert!(provider.model("mixtral-8x7b").is_some());
        assert!(provider.model("gpt-4").is_none());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = valid_config();
        config.endpoint = "::".to_string();
        let err = Provider::from_config(&config, Utc::now()).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref v) if v.len() == 1));
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let toml_str = r#"
id = "local"
name = "Local"
endpoint = "http://localhost:8080/v1"
"#;
        let config: ProviderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tier, "free");
        assert!(config.is_active);
        assert!(config.models.is_empty());
        assert!(config.rate_limit.is_none());
    }
}
