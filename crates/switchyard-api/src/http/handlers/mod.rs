//! REST API handler modules.

pub mod cache;
pub mod conversation;
pub mod provider;
pub mod session;
