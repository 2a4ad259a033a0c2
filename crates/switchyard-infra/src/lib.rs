//! Infrastructure layer for Switchyard.
//!
//! Contains implementations of the ports defined in `switchyard-core`:
//! the TOML configuration loader, environment-variable API key lookup, and
//! the reqwest-based provider probe and chat transport.

pub mod config;
pub mod http;
pub mod secret;
