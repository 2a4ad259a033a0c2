//! Global configuration types for Switchyard.
//!
//! `GatewayConfig` represents the top-level `config.toml` that controls cache
//! sizing, conversation retention, timeouts, the HTTP server and the provider
//! catalog.

use serde::{Deserialize, Serialize};

use crate::provider::{ModelDescriptor, ProviderConfig, RateLimitConfig};

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub conversations: ConversationConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Provider catalog. Falls back to the built-in catalog when omitted.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            conversations: ConversationConfig::default(),
            timeouts: TimeoutConfig::default(),
            server: ServerConfig::default(),
            providers: default_providers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of memoized entries before FIFO eviction.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// TTL for entries whose provider has no rate-limit policy.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            default_ttl_ms: default_ttl_ms(),
        }
    }
}

fn default_cache_capacity() -> usize {
    500
}

fn default_ttl_ms() -> u64 {
    300_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Conversations retained before the oldest is evicted.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
        }
    }
}

fn default_max_conversations() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_health_check_ms")]
    pub health_check_ms: u64,
    #[serde(default = "default_dispatch_ms")]
    pub dispatch_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            health_check_ms: default_health_check_ms(),
            dispatch_ms: default_dispatch_ms(),
        }
    }
}

fn default_health_check_ms() -> u64 {
    5_000
}

fn default_dispatch_ms() -> u64 {
    60_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Built-in catalog used when no `[[providers]]` are configured.
///
/// OpenAI ships inactive; it has to be activated explicitly.
pub fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            id: "openai".to_string(),
            name: "OpenAI".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            models: vec![
                ModelDescriptor::new("gpt-4").with_capability("chat"),
                ModelDescriptor::new("gpt-4o-mini").with_capability("chat"),
            ],
            rate_limit: Some(RateLimitConfig {
                max_requests: 60,
                window_ms: 60_000,
                requests_per_day: None,
                tokens_per_minute: Some(90_000),
            }),
            tier: "paid".to_string(),
            is_active: false,
        },
        ProviderConfig {
            id: "anthropic".to_string(),
            name: "Anthropic".to_string(),
            endpoint: "https://api.anthropic.com/v1".to_string(),
            models: vec![ModelDescriptor::new("claude-3-5-sonnet").with_capability("chat")],
            rate_limit: Some(RateLimitConfig {
                max_requests: 50,
                window_ms: 60_000,
                requests_per_day: None,
                tokens_per_minute: None,
            }),
            tier: "paid".to_string(),
            is_active: true,
        },
        ProviderConfig {
            id: "groq".to_string(),
            name: "Groq".to_string(),
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            models: vec![
                ModelDescriptor::new("llama3-70b").with_capability("chat"),
                ModelDescriptor::new("mixtral-8x7b").with_capability("chat"),
            ],
            rate_limit: Some(RateLimitConfig {
                max_requests: 30,
                window_ms: 60_000,
                requests_per_day: Some(14_400),
                tokens_per_minute: None,
            }),
            tier: "free".to_string(),
            is_active: true,
        },
    ]
}
