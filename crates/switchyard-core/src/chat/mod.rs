//! Conversation logs consumed by the gateway to build request context.

pub mod store;

pub use store::ConversationStore;
