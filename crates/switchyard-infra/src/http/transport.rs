//! HttpTransport: OpenAI-compatible chat completions over HTTP.
//!
//! Posts `{model, messages}` to `{endpoint}/chat/completions` and hands the
//! JSON body back untouched; the gateway caches it as an opaque value.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use url::Url;

use switchyard_core::provider::ProviderTransport;
use switchyard_types::chat::Message;
use switchyard_types::error::GatewayError;
use switchyard_types::provider::Provider;

use super::build_client;
use crate::secret::EnvSecretProvider;

/// Longest upstream error body echoed into an error message.
const MAX_ERROR_BODY: usize = 200;

pub struct HttpTransport {
    client: reqwest::Client,
    secrets: EnvSecretProvider,
}

impl HttpTransport {
    pub fn new(timeout: Duration, secrets: EnvSecretProvider) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(timeout)?,
            secrets,
        })
    }
}

impl ProviderTransport for HttpTransport {
    async fn send(
        &self,
        provider: &Provider,
        model_id: &str,
        messages: &[Message],
    ) -> Result<Value, GatewayError> {
        let url = completions_url(&provider.endpoint);
        let mut request = self
            .client
            .post(url)
            .json(&completion_body(model_id, messages));
        if let Some(key) = self.secrets.api_key(&provider.id) {
            request = request.bearer_auth(key.expose_secret());
        } else {
            tracing::debug!(provider_id = %provider.id, "No API key set, sending unauthenticated");
        }

        let response = request.send().await.map_err(|e| {
            GatewayError::Provider(format!("request to '{}' failed: {e}", provider.id))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(&provider.id, status, &body));
        }

        response.json::<Value>().await.map_err(|e| {
            GatewayError::Provider(format!("'{}' returned malformed JSON: {e}", provider.id))
        })
    }
}

/// `{endpoint}/chat/completions`, tolerating a trailing slash on the endpoint.
pub fn completions_url(endpoint: &Url) -> String {
    format!("{}/chat/completions", endpoint.as_str().trim_end_matches('/'))
}

/// OpenAI-style request body.
pub fn completion_body(model_id: &str, messages: &[Message]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| json!({ "role": m.role, "content": m.content }))
        .collect();
    json!({ "model": model_id, "messages": messages })
}

fn status_error(provider_id: &str, status: StatusCode, body: &str) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return GatewayError::Provider(format!("'{provider_id}' rate limited upstream"));
    }
    let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
    GatewayError::Provider(format!("'{provider_id}' answered {status}: {snippet}"))
}
