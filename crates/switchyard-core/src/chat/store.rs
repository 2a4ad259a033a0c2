//! In-memory conversation logs with bounded retention.
//!
//! Conversations are kept in insertion order and the oldest is evicted once
//! the configured maximum is exceeded, the same FIFO policy the response
//! cache uses. A "current" pointer tracks the conversation a session is
//! working in; it is cleared whenever its target disappears.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use switchyard_types::chat::{
    approx_tokens, Conversation, ConversationStats, Message, MessageRole, NewMessage,
};
use switchyard_types::error::{GatewayError, ResourceKind};

use crate::cache::{BoundedMap, EvictionPolicy};
use crate::clock::Clock;

struct StoreState {
    conversations: BoundedMap<String, Conversation>,
    current: Option<String>,
}

impl StoreState {
    fn get_mut(&mut self, id: &str) -> Result<&mut Conversation, GatewayError> {
        self.conversations
            .get_mut(&id.to_string())
            .ok_or_else(|| not_found(id))
    }
}

/// Append-only message logs, one per conversation id.
pub struct ConversationStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl ConversationStore {
    /// Create a store retaining at most `max_conversations`.
    pub fn new(max_conversations: usize, clock: Arc<dyn Clock>) -> Result<Self, GatewayError> {
        Ok(Self {
            state: Mutex::new(StoreState {
                conversations: BoundedMap::new(max_conversations, EvictionPolicy::Fifo)?,
                current: None,
            }),
            clock,
        })
    }

    /// Start a conversation. A fresh UUIDv7 id is generated if none is given.
    ///
    /// Ids must be unique among retained conversations.
    pub fn create(&self, id: Option<&str>) -> Result<Conversation, GatewayError> {
        let id = match id {
            Some(id) if id.trim().is_empty() => {
                return Err(GatewayError::validation(
                    "conversation id must be a non-empty string",
                ));
            }
            Some(id) => id.to_string(),
            None => Uuid::now_v7().to_string(),
        };

        let conversation = Conversation::new(id.clone(), self.clock.now());
        let mut state = self.lock();
        if state.conversations.contains_key(&id) {
            return Err(GatewayError::validation(format!(
                "conversation '{id}' already exists"
            )));
        }

        let outcome = state.conversations.insert(id.clone(), conversation.clone());
        for (evicted, _) in outcome.evicted {
            if state.current.as_deref() == Some(evicted.as_str()) {
                state.current = None;
            }
            debug!(conversation_id = %evicted, "Evicted oldest conversation");
        }
        info!(conversation_id = %id, "Conversation created");
        Ok(conversation)
    }

    /// Validate and append a message, returning the updated conversation.
    ///
    /// Input is checked before the conversation is looked up, and nothing is
    /// mutated on failure.
    pub fn append(
        &self,
        conversation_id: &str,
        message: NewMessage,
    ) -> Result<Conversation, GatewayError> {
        let (role, content) = validate_message(message)?;
        let now = self.clock.now();

        let mut state = self.lock();
        let conversation = state.get_mut(conversation_id)?;
        conversation.messages.push(Message {
            id: Uuid::now_v7(),
            role,
            content,
            timestamp: now,
        });
        conversation.last_modified = now;
        debug!(
            conversation_id,
            role = %role,
            messages = conversation.messages.len(),
            "Message appended"
        );
        Ok(conversation.clone())
    }

    pub fn get(&self, conversation_id: &str) -> Result<Conversation, GatewayError> {
        self.lock()
            .conversations
            .get(&conversation_id.to_string())
            .cloned()
            .ok_or_else(|| not_found(conversation_id))
    }

    /// Retained conversations, oldest first.
    pub fn list(&self) -> Vec<Conversation> {
        self.lock().conversations.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The conversation the current pointer targets, if any.
    pub fn current(&self) -> Option<Conversation> {
        let state = self.lock();
        let id = state.current.as_ref()?;
        state.conversations.get(id).cloned()
    }

    pub fn set_current(&self, conversation_id: &str) -> Result<(), GatewayError> {
        let mut state = self.lock();
        if !state.conversations.contains_key(&conversation_id.to_string()) {
            return Err(not_found(conversation_id));
        }
        state.current = Some(conversation_id.to_string());
        Ok(())
    }

    /// Empty the message log but keep the conversation.
    pub fn clear(&self, conversation_id: &str) -> Result<(), GatewayError> {
        let now = self.clock.now();
        let mut state = self.lock();
        let conversation = state.get_mut(conversation_id)?;
        conversation.messages.clear();
        conversation.last_modified = now;
        debug!(conversation_id, "Conversation cleared");
        Ok(())
    }

    /// Remove a conversation entirely.
    pub fn delete(&self, conversation_id: &str) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state
            .conversations
            .remove(&conversation_id.to_string())
            .ok_or_else(|| not_found(conversation_id))?;
        if state.current.as_deref() == Some(conversation_id) {
            state.current = None;
        }
        info!(conversation_id, "Conversation deleted");
        Ok(())
    }

    pub fn stats(&self, conversation_id: &str) -> Result<ConversationStats, GatewayError> {
        let conversation = self.get(conversation_id)?;
        Ok(ConversationStats {
            message_count: conversation.messages.len(),
            approx_token_count: conversation
                .messages
                .iter()
                .map(|m| approx_tokens(&m.content))
                .sum(),
            created_at: conversation.created_at,
            last_modified: conversation.last_modified,
        })
    }

    /// Replace a message's content. Its id and role are kept; its timestamp
    /// is refreshed.
    pub fn update_message(
        &self,
        conversation_id: &str,
        message_id: Uuid,
        content: &str,
    ) -> Result<Message, GatewayError> {
        if content.trim().is_empty() {
            return Err(GatewayError::validation(
                "message content must be a non-empty string",
            ));
        }
        let now = self.clock.now();
        let mut state = self.lock();
        let conversation = state.get_mut(conversation_id)?;
        let message = conversation
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Message, message_id.to_string()))?;
        message.content = content.to_string();
        message.timestamp = now;
        let updated = message.clone();
        conversation.last_modified = now;
        Ok(updated)
    }

    pub fn set_metadata(
        &self,
        conversation_id: &str,
        key: &str,
        value: Value,
    ) -> Result<(), GatewayError> {
        if key.is_empty() {
            return Err(GatewayError::validation("metadata key must not be empty"));
        }
        let now = self.clock.now();
        let mut state = self.lock();
        let conversation = state.get_mut(conversation_id)?;
        conversation.metadata.insert(key.to_string(), value);
        conversation.last_modified = now;
        Ok(())
    }

    /// The last `limit` messages, oldest first.
    pub fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, GatewayError> {
        let state = self.lock();
        let conversation = state
            .conversations
            .get(&conversation_id.to_string())
            .ok_or_else(|| not_found(conversation_id))?;
        let skip = conversation.messages.len().saturating_sub(limit);
        Ok(conversation.messages[skip..].to_vec())
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Check role and content, collecting both violations.
fn validate_message(message: NewMessage) -> Result<(MessageRole, String), GatewayError> {
    let mut errors = Vec::new();
    let role = match message.role.parse::<MessageRole>() {
        Ok(role) => Some(role),
        Err(e) => {
            errors.push(e);
            None
        }
    };
    if message.content.trim().is_empty() {
        errors.push("message content must be a non-empty string".to_string());
    }

    match role {
        Some(role) if errors.is_empty() => Ok((role, message.content)),
        _ => Err(GatewayError::Validation(errors)),
    }
}

fn not_found(conversation_id: &str) -> GatewayError {
    GatewayError::not_found(ResourceKind::Conversation, conversation_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::time::Duration;

    fn store(max: usize) -> (ConversationStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (ConversationStore::new(max, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn test_create_generates_id() {
        let (store, _clock) = store(5);
        let a = store.create(None).unwrap();
        let b = store.create(None).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.messages.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_create_rejects_empty_and_duplicate_ids() {
        let (store, _clock) = store(5);
        store.create(Some("c1")).unwrap();
        assert!(matches!(
            store.create(Some("c1")).unwrap_err(),
            GatewayError::Validation(_)
        ));
        assert!(matches!(
            store.create(Some("  ")).unwrap_err(),
            GatewayError::Validation(_)
        ));
    }

    #[test]
    fn test_append_assigns_id_and_timestamp() {
        let (store, clock) = store(5);
        store.create(Some("c1")).unwrap();
        clock.advance(Duration::from_secs(2));

        let conversation = store.append("c1", NewMessage::user("hello")).unwrap();
        assert_eq!(conversation.messages.len(), 1);
        let message = &conversation.messages[0];
        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.content, "hello");
        assert_eq!(message.timestamp, clock.now());
        assert_eq!(conversation.last_modified, clock.now());
    }

    #[test]
    fn test_append_invalid_role_does_not_mutate() {
        let (store, _clock) = store(5);
        store.create(Some("c1")).unwrap();
        store.append("c1", NewMessage::user("first")).unwrap();

        for role in ["bot", "User", ""] {
            let err = store.append("c1", NewMessage::new(role, "text")).unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)));
        }
        assert_eq!(store.get("c1").unwrap().messages.len(), 1);
    }

    #[test]
    fn test_append_reports_role_and_content_together() {
        let (store, _clock) = store(5);
        store.create(Some("c1")).unwrap();
        match store.append("c1", NewMessage::new("robot", " ")).unwrap_err() {
            GatewayError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_append_unknown_conversation() {
        let (store, _clock) = store(5);
        assert_eq!(
            store.append("ghost", NewMessage::user("hi")).unwrap_err(),
            GatewayError::not_found(ResourceKind::Conversation, "ghost")
        );
    }

    #[test]
    fn test_current_pointer_lifecycle() {
        let (store, _clock) = store(5);
        assert!(store.current().is_none());
        assert!(store.set_current("c1").is_err());

        store.create(Some("c1")).unwrap();
        store.set_current("c1").unwrap();
        assert_eq!(store.current().unwrap().id, "c1");

        store.delete("c1").unwrap();
        assert!(store.current().is_none());
        assert!(store.delete("c1").is_err());
    }

    #[test]
    fn test_eviction_is_fifo_and_clears_current() {
        let (store, _clock) = store(2);
        store.create(Some("a")).unwrap();
        store.create(Some("b")).unwrap();
        store.set_current("a").unwrap();
        store.append("a", NewMessage::user("keep me?")).unwrap();

        store.create(Some("c")).unwrap();
        assert!(store.get("a").is_err());
        assert!(store.current().is_none());
        let ids: Vec<String> = store.list().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_clear_keeps_conversation() {
        let (store, _clock) = store(5);
        store.create(Some("c1")).unwrap();
        store.append("c1", NewMessage::user("hi")).unwrap();
        store.clear("c1").unwrap();

        let conversation = store.get("c1").unwrap();
        assert!(conversation.messages.is_empty());
    }

    #[test]
    fn test_stats_approximates_tokens() {
        let (store, _clock) = store(5);
        let created = store.create(Some("c1")).unwrap();
        store.append("c1", NewMessage::user("abcd")).unwrap(); // 1
        store.append("c1", NewMessage::assistant("abcde")).unwrap(); // 2

        let stats = store.stats("c1").unwrap();
        assert_eq!(stats.message_count, 2);
        assert_eq!(stats.approx_token_count, 3);
        assert_eq!(stats.created_at, created.created_at);
    }

    #[test]
    fn test_update_message_refreshes_timestamp() {
        let (store, clock) = store(5);
        store.create(Some("c1")).unwrap();
        let conversation = store.append("c1", NewMessage::user("draft")).unwrap();
        let original = conversation.messages[0].clone();

        clock.advance(Duration::from_secs(5));
        let updated = store.update_message("c1", original.id, "final").unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.role, original.role);
        assert_eq!(updated.content, "final");
        assert!(updated.timestamp > original.timestamp);

        assert!(matches!(
            store.update_message("c1", Uuid::now_v7(), "x").unwrap_err(),
            GatewayError::NotFound { kind: ResourceKind::Message, .. }
        ));
    }

    #[test]
    fn test_metadata_and_recent_messages() {
        let (store, _clock) = store(5);
        store.create(Some("c1")).unwrap();
        for text in ["one", "two", "three"] {
            store.append("c1", NewMessage::user(text)).unwrap();
        }
        store.set_metadata("c1", "last_provider", json!("groq")).unwrap();

        let conversation = store.get("c1").unwrap();
        assert_eq!(conversation.metadata["last_provider"], json!("groq"));

        let recent = store.recent_messages("c1", 2).unwrap();
        let texts: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
        assert_eq!(store.recent_messages("c1", 10).unwrap().len(), 3);
    }
}
