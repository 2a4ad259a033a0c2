//! Provider-mediation logic for Switchyard.
//!
//! This crate holds the components that decide which provider serves a
//! request, enforce per-provider request budgets, memoize responses and
//! keep conversation logs. It defines the ports (`ProviderProbe`,
//! `ProviderTransport`) that the infrastructure layer implements and never
//! depends on `switchyard-infra` or any HTTP crate.

pub mod cache;
pub mod chat;
pub mod clock;
pub mod provider;
