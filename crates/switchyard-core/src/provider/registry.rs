//! Provider catalog with validated lookup.
//!
//! Providers are never removed during a session; they are deactivated.
//! Lookups distinguish "missing" ([`GatewayError::NotFound`]) from "known but
//! unusable" ([`GatewayError::Inactive`], [`GatewayError::ModelUnavailable`]).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use switchyard_types::error::{GatewayError, ResourceKind};
use switchyard_types::provider::{validate_provider_config, ModelDescriptor, Provider, ProviderConfig};

use crate::clock::Clock;

#[derive(Default)]
struct Catalog {
    providers: HashMap<String, Provider>,
    /// Registration order, for stable listings.
    order: Vec<String>,
}

impl Catalog {
    fn get_mut(&mut self, provider_id: &str) -> Result<&mut Provider, GatewayError> {
        self.providers
            .get_mut(provider_id)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Provider, provider_id))
    }

    fn ordered(&self) -> impl Iterator<Item = &Provider> {
        self.order.iter().filter_map(|id| self.providers.get(id))
    }
}

/// Registry of known providers, indexed by id.
pub struct ProviderRegistry {
    catalog: RwLock<Catalog>,
    clock: Arc<dyn Clock>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            clock,
        }
    }

    /// Build a registry from a raw catalog.
    ///
    /// The whole catalog is validated before anything is registered. Every
    /// violation across every entry is returned, prefixed with the entry's
    /// position and id.
    pub fn from_configs(
        configs: &[ProviderConfig],
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        let mut errors = Vec::new();
        let mut seen = HashMap::new();

        for (idx, config) in configs.iter().enumerate() {
            let label = format!("providers[{idx}] ({})", config.id);
            for message in validate_provider_config(config) {
                errors.push(format!("{label}: {message}"));
            }
            let id = config.id.trim();
            if !id.is_empty() {
                if let Some(first) = seen.insert(id.to_string(), idx) {
                    errors.push(format!(
                        "{label}: id '{id}' duplicates providers[{first}]"
                    ));
                }
            }
        }
        if !errors.is_empty() {
            return Err(GatewayError::Validation(errors));
        }

        let registry = Self::new(clock);
        for config in configs {
            registry.register(config)?;
        }
        Ok(registry)
    }

    /// Validate and add a provider. Duplicate ids are rejected.
    pub fn register(&self, config: &ProviderConfig) -> Result<Provider, GatewayError> {
        let provider = Provider::from_config(config, self.clock.now())?;

        let mut catalog = self.write();
        if catalog.providers.contains_key(&provider.id) {
            return Err(GatewayError::validation(format!(
                "provider '{}' is already registered",
                provider.id
            )));
        }
        catalog.order.push(provider.id.clone());
        catalog
            .providers
            .insert(provider.id.clone(), provider.clone());

        info!(
            provider_id = %provider.id,
            tier = %provider.tier,
            active = provider.is_active,
            models = provider.models.len(),
            "Provider registered"
        );
        Ok(provider)
    }

    /// Look up a provider regardless of its active flag.
    pub fn get(&self, provider_id: &str) -> Option<Provider> {
        self.read().providers.get(provider_id).cloned()
    }

    /// Every provider, in registration order.
    pub fn list_all(&self) -> Vec<Provider> {
        self.read().ordered().cloned().collect()
    }

    /// Active providers, in registration order.
    pub fn list_active(&self) -> Vec<Provider> {
        self.read()
            .ordered()
            .filter(|p| p.is_active)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a usable provider.
    ///
    /// Fails with `NotFound` for an unknown id and `Inactive` for a
    /// deactivated one.
    pub fn resolve(&self, provider_id: &str) -> Result<Provider, GatewayError> {
        let catalog = self.read();
        let provider = catalog
            .providers
            .get(provider_id)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Provider, provider_id))?;
        if !provider.is_active {
            return Err(GatewayError::Inactive(provider_id.to_string()));
        }
        Ok(provider.clone())
    }

    /// Resolve a model on a usable provider.
    ///
    /// Provider checks run first, so an inactive provider never reports
    /// `ModelUnavailable`.
    pub fn resolve_model(
        &self,
        provider_id: &str,
        model_id: &str,
    ) -> Result<ModelDescriptor, GatewayError> {
        let provider = self.resolve(provider_id)?;
        provider
            .model(model_id)
            .cloned()
            .ok_or_else(|| GatewayError::ModelUnavailable {
                provider_id: provider_id.to_string(),
                model_id: model_id.to_string(),
            })
    }

    /// Mark a provider active. Idempotent; `updated_at` only moves on change.
    pub fn activate(&self, provider_id: &str) -> Result<Provider, GatewayError> {
        self.set_active(provider_id, true)
    }

    /// Mark a provider inactive. Idempotent; `updated_at` only moves on change.
    pub fn deactivate(&self, provider_id: &str) -> Result<Provider, GatewayError> {
        self.set_active(provider_id, false)
    }

    /// Add a model to a provider's catalog.
    ///
    /// Returns `false` without changing anything if the id is already there.
    pub fn add_model(
        &self,
        provider_id: &str,
        model: ModelDescriptor,
    ) -> Result<bool, GatewayError> {
        if model.id.trim().is_empty() {
            return Err(GatewayError::validation("model id must be a non-empty string"));
        }
        let now = self.clock.now();
        let mut catalog = self.write();
        let provider = catalog.get_mut(provider_id)?;
        if provider.model(&model.id).is_some() {
            return Ok(false);
        }
        info!(provider_id, model_id = %model.id, "Model added");
        provider.models.push(model);
        provider.updated_at = now;
        Ok(true)
    }

    /// Remove a model. Returns whether anything was removed.
    pub fn remove_model(&self, provider_id: &str, model_id: &str) -> Result<bool, GatewayError> {
        let now = self.clock.now();
        let mut catalog = self.write();
        let provider = catalog.get_mut(provider_id)?;
        let before = provider.models.len();
        provider.models.retain(|m| m.id != model_id);
        let removed = provider.models.len() != before;
        if removed {
            provider.updated_at = now;
            info!(provider_id, model_id, "Model removed");
        }
        Ok(removed)
    }

    fn set_active(&self, provider_id: &str, active: bool) -> Result<Provider, GatewayError> {
        let now = self.clock.now();
        let mut catalog = self.write();
        let provider = catalog.get_mut(provider_id)?;
        if provider.is_active != active {
            provider.is_active = active;
            provider.updated_at = now;
            info!(provider_id, active, "Provider active flag changed");
        }
        Ok(provider.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;
    use switchyard_types::config::default_providers;
    use switchyard_types::provider::RateLimitConfig;

    fn registry() -> (ProviderRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let registry = ProviderRegistry::from_configs(&default_providers(), clock.clone()).unwrap();
        (registry, clock)
    }

    fn config(id: &str) -> ProviderConfig {
        ProviderConfig {
            id: id.to_string(),
            name: id.to_uppercase(),
            endpoint: "http://localhost:11434/v1".to_string(),
            models: vec![ModelDescriptor::new("llama3")],
            rate_limit: None,
            tier: "free".to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_default_catalog_loads() {
        let (registry, _clock) = registry();
        assert_eq!(registry.len(), 3);
        let ids: Vec<String> = registry.list_all().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["openai", "anthropic", "groq"]);

        let active: Vec<String> = registry.list_active().into_iter().map(|p| p.id).collect();
        assert_eq!(active, vec!["anthropic", "groq"]);
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let (registry, _clock) = registry();
        let err = registry.resolve("mistral").unwrap_err();
        assert_eq!(err, GatewayError::not_found(ResourceKind::Provider, "mistral"));
    }

    #[test]
    fn test_inactive_checked_before_model() {
        let (registry, _clock) = registry();
        assert_eq!(
            registry.resolve("openai").unwrap_err(),
            GatewayError::Inactive("openai".to_string())
        );
        // Even for a model that does not exist.
        assert_eq!(
            registry.resolve_model("openai", "no-such-model").unwrap_err(),
            GatewayError::Inactive("openai".to_string())
        );
    }

    #[test]
    fn test_resolve_model() {
        let (registry, _clock) = registry();
        assert_eq!(registry.resolve_model("groq", "llama3-70b").unwrap().id, "llama3-70b");
        assert!(matches!(
            registry.resolve_model("groq", "gpt-4").unwrap_err(),
            GatewayError::ModelUnavailable { .. }
        ));
    }

    #[test]
    fn test_activate_is_idempotent() {
        let (registry, clock) = registry();
        let created = registry.get("openai").unwrap().updated_at;

        clock.advance(Duration::from_secs(1));
        let activated = registry.activate("openai").unwrap();
        assert!(activated.is_active);
        assert!(activated.updated_at > created);

        clock.advance(Duration::from_secs(1));
        let again = registry.activate("openai").unwrap();
        assert_eq!(again.updated_at, activated.updated_at);

        registry.deactivate("openai").unwrap();
        registry.deactivate("openai").unwrap();
        assert!(!registry.get("openai").unwrap().is_active);
        assert!(registry.activate("missing").is_err());
    }

    #[test]
    fn test_add_and_remove_model() {
        let (registry, clock) = registry();
        clock.advance(Duration::from_secs(1));

        assert!(registry.add_model("groq", ModelDescriptor::new("gemma-7b")).unwrap());
        assert!(!registry.add_model("groq", ModelDescriptor::new("gemma-7b")).unwrap());
        assert_eq!(registry.get("groq").unwrap().models.len(), 3);
        assert!(registry.add_model("groq", ModelDescriptor::new(" ")).is_err());

        assert!(registry.remove_model("groq", "gemma-7b").unwrap());
        assert!(!registry.remove_model("groq", "gemma-7b").unwrap());
        assert!(registry.remove_model("missing", "x").is_err());
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let registry = ProviderRegistry::new(Arc::new(ManualClock::default()));
        registry.register(&config("local")).unwrap();
        let err = registry.register(&config("local")).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_configs_reports_every_entry() {
        let mut bad = config("bad");
        bad.endpoint = "nope".to_string();
        bad.rate_limit = Some(RateLimitConfig {
            max_requests: -1,
            window_ms: 1000,
            requests_per_day: None,
            tokens_per_minute: None,
        });

        let configs = vec![config("local"), bad, config("local")];
        let err = ProviderRegistry::from_configs(&configs, Arc::new(ManualClock::default()))
            .err()
            .unwrap();

        match err {
            GatewayError::Validation(messages) => {
                assert_eq!(messages.len(), 3);
                assert!(messages[0].starts_with("providers[1] (bad): endpoint"));
                assert!(messages[1].starts_with("providers[1] (bad): rate_limit.max_requests"));
                assert!(messages[2].contains("duplicates providers[0]"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
