//! ProviderGateway: the composed request path.
//!
//! A request is resolved against the registry, looked up in the response
//! cache and, only on a miss, admitted by the rate limiter before the
//! outbound loader runs. Cache hits never consume rate budget.
//!
//! The gateway owns no provider I/O itself: connectivity goes through a
//! [`ProviderProbe`] and outbound calls through the loader (or a
//! [`ProviderTransport`] in [`ProviderGateway::converse`]).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use switchyard_types::chat::{Message, NewMessage};
use switchyard_types::config::GatewayConfig;
use switchyard_types::error::{GatewayError, ResourceKind};
use switchyard_types::gateway::{HealthReport, ProviderSelection, ProviderStatus, RateLimitInfo};
use switchyard_types::provider::{Provider, ProviderConfig};

use super::fingerprint::fingerprint;
use super::port::{extract_reply, ProviderProbe, ProviderTransport};
use super::rate_limiter::RateLimiter;
use super::registry::ProviderRegistry;
use crate::cache::CacheManager;
use crate::chat::ConversationStore;
use crate::clock::Clock;

/// Timeouts and cache defaults for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Upper bound on a single connectivity probe.
    pub health_check_timeout: Duration,
    /// Upper bound on a single outbound loader.
    pub dispatch_timeout: Duration,
    /// Cache TTL for providers without a rate-limit window.
    pub default_ttl: Duration,
}

impl GatewayOptions {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            health_check_timeout: Duration::from_millis(config.timeouts.health_check_ms),
            dispatch_timeout: Duration::from_millis(config.timeouts.dispatch_ms),
            default_ttl: Duration::from_millis(config.cache.default_ttl_ms),
        }
    }
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Orchestrates provider selection, probing and dispatch.
///
/// Every collaborator is injected, so several gateways (per tenant, per
/// test) can coexist in one process.
pub struct ProviderGateway<P> {
    registry: Arc<ProviderRegistry>,
    limiter: Arc<RateLimiter>,
    cache: Arc<CacheManager<Value>>,
    conversations: Arc<ConversationStore>,
    probe: P,
    selections: DashMap<String, ProviderSelection>,
    clock: Arc<dyn Clock>,
    options: GatewayOptions,
}

impl<P: ProviderProbe> ProviderGateway<P> {
    /// Assemble a gateway from its parts.
    ///
    /// Rate-limit policies of every registered provider are synced into the
    /// limiter.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        limiter: Arc<RateLimiter>,
        cache: Arc<CacheManager<Value>>,
        conversations: Arc<ConversationStore>,
        probe: P,
        clock: Arc<dyn Clock>,
        options: GatewayOptions,
    ) -> Self {
        for provider in registry.list_all() {
            if let Some(policy) = provider.rate_limit {
                limiter.register(&provider.id, policy);
            }
        }
        Self {
            registry,
            limiter,
            cache,
            conversations,
            probe,
            selections: DashMap::new(),
            clock,
            options,
        }
    }

    /// Build every component from a loaded configuration.
    pub fn from_config(
        config: &GatewayConfig,
        probe: P,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        let options = GatewayOptions::from_config(config);
        let registry = ProviderRegistry::from_configs(&config.providers, clock.clone())?;
        let limiter = RateLimiter::new(clock.clone());
        let cache = CacheManager::new(config.cache.capacity, options.default_ttl, clock.clone())?;
        let conversations =
            ConversationStore::new(config.conversations.max_conversations, clock.clone())?;

        Ok(Self::new(
            Arc::new(registry),
            Arc::new(limiter),
            Arc::new(cache),
            Arc::new(conversations),
            probe,
            clock,
            options,
        ))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &CacheManager<Value> {
        &self.cache
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn options(&self) -> GatewayOptions {
        self.options
    }

    /// Add a provider at runtime and start tracking its rate window.
    pub fn register_provider(&self, config: &ProviderConfig) -> Result<Provider, GatewayError> {
        let provider = self.registry.register(config)?;
        if let Some(policy) = provider.rate_limit {
            self.limiter.register(&provider.id, policy);
        }
        Ok(provider)
    }

    /// Set a session's routing choice.
    ///
    /// Without a model id the provider's first model is used. The previous
    /// selection for the session, if any, is replaced.
    pub fn select_provider(
        &self,
        session_id: &str,
        provider_id: &str,
        model_id: Option<&str>,
    ) -> Result<ProviderSelection, GatewayError> {
        if session_id.trim().is_empty() {
            return Err(GatewayError::validation("session id must be a non-empty string"));
        }
        let provider = self.registry.resolve(provider_id)?;
        let model_id = match model_id {
            Some(model_id) => self.registry.resolve_model(provider_id, model_id)?.id,
            None => provider
                .default_model()
                .map(|m| m.id.clone())
                .ok_or_else(|| GatewayError::ModelUnavailable {
                    provider_id: provider_id.to_string(),
                    model_id: "(default)".to_string(),
                })?,
        };

        let selection = ProviderSelection {
            provider_id: provider_id.to_string(),
            model_id,
            timestamp: self.clock.now(),
        };
        self.selections
            .insert(session_id.to_string(), selection.clone());
        info!(
            session_id,
            provider_id,
            model_id = %selection.model_id,
            "Provider selected"
        );
        Ok(selection)
    }

    /// The session's current selection, if one was made.
    pub fn selection(&self, session_id: &str) -> Option<ProviderSelection> {
        self.selections.get(session_id).map(|s| s.clone())
    }

    /// Probe a provider's endpoint.
    ///
    /// Works for inactive providers too; `can_connect` is reported
    /// independently of the active flag. A probe that outlives the health
    /// check timeout fails with [`GatewayError::Timeout`].
    pub async fn status(&self, provider_id: &str) -> Result<ProviderStatus, GatewayError> {
        let provider = self
            .registry
            .get(provider_id)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Provider, provider_id))?;

        let timeout = self.options.health_check_timeout;
        let can_connect = match tokio::time::timeout(timeout, self.probe.probe(&provider)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GatewayError::Timeout {
                    operation: format!("probe of '{provider_id}'"),
                    after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        Ok(ProviderStatus {
            id: provider.id,
            is_active: provider.is_active,
            can_connect,
            last_checked: self.clock.now(),
        })
    }

    /// Health of a provider. Never fails: errors are folded into the report.
    pub async fn health_check(&self, provider_id: &str) -> HealthReport {
        match self.status(provider_id).await {
            Ok(status) => {
                let is_healthy = status.is_active && status.can_connect;
                if !is_healthy {
                    warn!(
                        provider_id,
                        is_active = status.is_active,
                        can_connect = status.can_connect,
                        "Provider unhealthy"
                    );
                }
                HealthReport {
                    provider_id: provider_id.to_string(),
                    is_healthy,
                    details: json!({
                        "is_active": status.is_active,
                        "can_connect": status.can_connect,
                        "last_checked": status.last_checked,
                    }),
                }
            }
            Err(e) => {
                warn!(provider_id, error = %e, "Health check failed");
                HealthReport {
                    provider_id: provider_id.to_string(),
                    is_healthy: false,
                    details: json!({
                        "error": e.to_string(),
                        "kind": e.kind(),
                        "checked_at": self.clock.now(),
                    }),
                }
            }
        }
    }

    /// Health of every registered provider, probed concurrently.
    pub async fn health_check_all(&self) -> Vec<HealthReport> {
        let ids: Vec<String> = self.registry.list_all().into_iter().map(|p| p.id).collect();
        join_all(ids.iter().map(|id| self.health_check(id))).await
    }

    /// Current rate window of a provider, or `None` if it has no policy.
    pub fn rate_limit_info(
        &self,
        provider_id: &str,
    ) -> Result<Option<RateLimitInfo>, GatewayError> {
        if self.registry.get(provider_id).is_none() {
            return Err(GatewayError::not_found(ResourceKind::Provider, provider_id));
        }
        if !self.limiter.is_tracked(provider_id) {
            return Ok(None);
        }
        self.limiter.info(provider_id).map(Some)
    }

    /// Serve a request through the cache, calling `loader` only on a miss.
    ///
    /// 1. Resolve provider and model (`NotFound`, `Inactive`,
    ///    `ModelUnavailable`).
    /// 2. Look up `fingerprint` in the cache; a fresh hit returns at once.
    /// 3. On a miss, ask the rate limiter. A denial fails with
    ///    `RateLimitExceeded` and the loader is not called.
    /// 4. Run the loader under the dispatch timeout and cache a successful
    ///    result for the provider's window (or the default TTL).
    ///
    /// Concurrent dispatches with the same fingerprint share one loader run
    /// and one admission.
    pub async fn dispatch<F, Fut>(
        &self,
        provider_id: &str,
        model_id: &str,
        fingerprint: &str,
        loader: F,
    ) -> Result<Value, GatewayError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value, GatewayError>> + Send + 'static,
    {
        let provider = self.registry.resolve(provider_id)?;
        self.registry.resolve_model(provider_id, model_id)?;

        let ttl = provider
            .rate_limit
            .filter(|policy| policy.window_ms > 0)
            .map(|policy| Duration::from_millis(policy.window_ms))
            .unwrap_or(self.options.default_ttl);

        let limiter = self.limiter.clone();
        let dispatch_timeout = self.options.dispatch_timeout;
        let provider_id_owned = provider_id.to_string();
        let gated = move || async move {
            admit(&limiter, &provider_id_owned)?;
            match tokio::time::timeout(dispatch_timeout, loader()).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Provider(format!(
                    "request to '{provider_id_owned}' timed out after {}ms",
                    dispatch_timeout.as_millis()
                ))),
            }
        };

        debug!(provider_id, model_id, fingerprint, "Dispatching");
        let result = self.cache.get_or_compute(fingerprint, gated, Some(ttl)).await;
        if let Err(e) = &result {
            warn!(provider_id, model_id, fingerprint, error = %e, "Dispatch failed");
        }
        result
    }

    /// Run one chat turn on a conversation.
    ///
    /// Appends the user message, dispatches the conversation context through
    /// `transport` and appends the assistant reply, which is returned. If
    /// dispatch fails the user message stays in the log.
    pub async fn converse<T>(
        &self,
        conversation_id: &str,
        provider_id: &str,
        model_id: &str,
        content: &str,
        transport: Arc<T>,
    ) -> Result<Message, GatewayError>
    where
        T: ProviderTransport + 'static,
    {
        let provider = self.registry.resolve(provider_id)?;
        self.registry.resolve_model(provider_id, model_id)?;

        let conversation = self
            .conversations
            .append(conversation_id, NewMessage::user(content))?;

        let context: Vec<Value> = conversation
            .messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();
        let key = fingerprint(provider_id, model_id, &json!({ "messages": context }));

        let messages = conversation.messages;
        let model = model_id.to_string();
        let loader = move || async move { transport.send(&provider, &model, &messages).await };
        let response = self.dispatch(provider_id, model_id, &key, loader).await?;

        let reply = extract_reply(&response);
        if reply.trim().is_empty() {
            return Err(GatewayError::Provider(format!(
                "'{provider_id}' returned an empty reply"
            )));
        }

        let conversation = self
            .conversations
            .append(conversation_id, NewMessage::assistant(reply))?;
        self.conversations
            .set_metadata(conversation_id, "last_provider", json!(provider_id))?;
        self.conversations
            .set_metadata(conversation_id, "last_model", json!(model_id))?;

        conversation
            .messages
            .last()
            .cloned()
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Message, conversation_id))
    }
}

/// Consume one unit of rate budget, or explain why not.
///
/// Providers without a policy are not gated.
fn admit(limiter: &RateLimiter, provider_id: &str) -> Result<(), GatewayError> {
    if !limiter.is_tracked(provider_id) {
        return Ok(());
    }
    if limiter.admit(provider_id)? {
        return Ok(());
    }
    let info = limiter.info(provider_id)?;
    let reset_after = limiter.time_until_reset(provider_id)?;
    Err(GatewayError::RateLimitExceeded {
        provider_id: provider_id.to_string(),
        limit: info.limit,
        remaining: info.remaining,
        reset_after_ms: u64::try_from(reset_after.as_millis()).unwrap_or(u64::MAX),
    })
}
