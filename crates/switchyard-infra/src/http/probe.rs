//! HttpProbe: reachability check over plain HTTP.

use std::time::Duration;

use secrecy::ExposeSecret;

use switchyard_core::provider::ProviderProbe;
use switchyard_types::error::GatewayError;
use switchyard_types::provider::Provider;

use super::build_client;
use crate::secret::EnvSecretProvider;

/// Issues a `GET` to the provider endpoint.
///
/// Any HTTP answer below 500 counts as reachable: a 401 or 404 still proves
/// the endpoint is up. 5xx answers mean "down", and transport failures
/// (DNS, refused connection, TLS) are errors.
pub struct HttpProbe {
    client: reqwest::Client,
    secrets: EnvSecretProvider,
}

impl HttpProbe {
    pub fn new(timeout: Duration, secrets: EnvSecretProvider) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(timeout)?,
            secrets,
        })
    }
}

impl ProviderProbe for HttpProbe {
    async fn probe(&self, provider: &Provider) -> Result<bool, GatewayError> {
        let mut request = self.client.get(provider.endpoint.clone());
        if let Some(key) = self.secrets.api_key(&provider.id) {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            GatewayError::Provider(format!("probe of '{}' failed: {e}", provider.id))
        })?;

        let status = response.status();
        tracing::debug!(provider_id = %provider.id, status = status.as_u16(), "Probe answered");
        Ok(!status.is_server_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use switchyard_types::provider::{ModelDescriptor, ProviderConfig};

    fn provider(endpoint: &str) -> Provider {
        let config = ProviderConfig {
            id: "local".to_string(),
            name: "Local".to_string(),
            endpoint: endpoint.to_string(),
            models: vec![ModelDescriptor::new("llama3")],
            rate_limit: None,
            tier: "free".to_string(),
            is_active: true,
        };
        Provider::from_config(&config, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_probe_refused_connection_is_error() {
        // Bind then drop a listener to get a local port nobody is serving.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = HttpProbe::new(Duration::from_secs(2), EnvSecretProvider::new()).unwrap();
        let err = probe
            .probe(&provider(&format!("http://127.0.0.1:{port}/v1")))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Provider(_)));
    }
}
