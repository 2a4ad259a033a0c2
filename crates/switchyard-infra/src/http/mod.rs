//! reqwest-based implementations of the provider ports.

pub mod probe;
pub mod transport;

pub use probe::HttpProbe;
pub use transport::HttpTransport;

use std::time::Duration;

use switchyard_types::error::GatewayError;

/// Shared client construction for probe and transport.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("switchyard/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GatewayError::Config(format!("failed to create HTTP client: {e}")))
}
