//! Provider mediation.
//!
//! - `ProviderRegistry`: validated catalog lookup
//! - `RateLimiter`: sliding-window admission per provider
//! - `ProviderGateway`: selection, probing and cached, rate-limited dispatch
//! - `ProviderProbe` / `ProviderTransport`: outbound ports implemented in infra

pub mod fingerprint;
pub mod gateway;
pub mod port;
pub mod rate_limiter;
pub mod registry;

pub use fingerprint::fingerprint;
pub use gateway::{GatewayOptions, ProviderGateway};
pub use port::{extract_reply, ProviderProbe, ProviderTransport};
pub use rate_limiter::RateLimiter;
pub use registry::ProviderRegistry;
