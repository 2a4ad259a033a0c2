//! Observability setup for Switchyard.

pub mod tracing_setup;
