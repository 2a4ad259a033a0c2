//! Shared domain types for Switchyard.
//!
//! This crate contains the domain types used across the provider-mediation
//! layer: providers and their models, rate-limit policies, conversations,
//! gateway DTOs (selection, status, health) and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, url.

pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod provider;
