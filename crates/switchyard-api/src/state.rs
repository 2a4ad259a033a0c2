//! Application state wiring the gateway to its infra adapters.
//!
//! AppState holds the concrete gateway used by both CLI and REST API. The
//! gateway is generic over its probe port; AppState pins it to the
//! reqwest-based implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use switchyard_core::clock::SystemClock;
use switchyard_core::provider::{GatewayOptions, ProviderGateway};
use switchyard_infra::config::{load_gateway_config, resolve_config_path};
use switchyard_infra::http::{HttpProbe, HttpTransport};
use switchyard_infra::secret::EnvSecretProvider;
use switchyard_types::config::GatewayConfig;

/// Gateway pinned to the HTTP probe.
pub type ConcreteGateway = ProviderGateway<HttpProbe>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ConcreteGateway>,
    pub transport: Arc<HttpTransport>,
    pub config: Arc<GatewayConfig>,
    pub config_path: PathBuf,
}

impl AppState {
    /// Load the configuration and wire the gateway.
    pub async fn init(config_override: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(config_override);
        let config = load_gateway_config(&config_path)
            .await
            .with_context(|| format!("failed to load {}", config_path.display()))?;

        Self::from_config(config, config_path)
    }

    /// Wire the gateway from an already loaded configuration.
    pub fn from_config(config: GatewayConfig, config_path: PathBuf) -> anyhow::Result<Self> {
        let options = GatewayOptions::from_config(&config);
        let secrets = EnvSecretProvider::new();

        let probe = HttpProbe::new(options.health_check_timeout, secrets.clone())
            .context("failed to build provider probe")?;
        // The gateway enforces the dispatch timeout itself; the client limit
        // only stops a stuck connection from outliving it.
        let transport = HttpTransport::new(
            options.dispatch_timeout + Duration::from_secs(1),
            secrets,
        )
        .context("failed to build provider transport")?;

        let gateway = ProviderGateway::from_config(&config, probe, Arc::new(SystemClock))
            .context("invalid provider catalog")?;

        tracing::debug!(
            config = %config_path.display(),
            providers = gateway.registry().len(),
            "Application state initialized"
        );

        Ok(Self {
            gateway: Arc::new(gateway),
            transport: Arc::new(transport),
            config: Arc::new(config),
            config_path,
        })
    }
}
