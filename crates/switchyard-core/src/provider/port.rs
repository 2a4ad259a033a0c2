//! Outbound ports implemented by the infrastructure layer.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition). The gateway is
//! generic over [`ProviderProbe`]; [`ProviderTransport`] is only used inside
//! dispatch loaders, so it is passed per call.
//!
//! Implementations live in switchyard-infra (`HttpProbe`, `HttpTransport`).

use serde_json::Value;

use switchyard_types::chat::Message;
use switchyard_types::error::GatewayError;
use switchyard_types::provider::Provider;

/// Lightweight reachability check for a provider endpoint.
pub trait ProviderProbe: Send + Sync {
    /// `Ok(true)` if the endpoint answered, `Ok(false)` if it answered in a
    /// way that means "down". Transport failures are errors.
    fn probe(
        &self,
        provider: &Provider,
    ) -> impl std::future::Future<Output = Result<bool, GatewayError>> + Send;
}

/// The actual call to a provider's text-generation API.
///
/// The response body is returned as opaque JSON; the gateway caches it as-is.
pub trait ProviderTransport: Send + Sync {
    fn send(
        &self,
        provider: &Provider,
        model_id: &str,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<Value, GatewayError>> + Send;
}

/// Pull the assistant text out of a provider response.
///
/// Understands OpenAI-style `choices[0].message.content` and Anthropic-style
/// `content[0].text`. Anything else is rendered as JSON text.
pub fn extract_reply(response: &Value) -> String {
    if let Some(text) = response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        return text.to_string();
    }
    if let Some(text) = response.pointer("/content/0/text").and_then(Value::as_str) {
        return text.to_string();
    }
    match response {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
