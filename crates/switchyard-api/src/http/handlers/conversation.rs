//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/conversations                                  - Create
//! - GET    /api/v1/conversations                                  - List (oldest first)
//! - GET    /api/v1/conversations/current                          - Current conversation
//! - GET    /api/v1/conversations/{id}                             - Get
//! - DELETE /api/v1/conversations/{id}                             - Delete
//! - PUT    /api/v1/conversations/{id}/current                     - Make current
//! - POST   /api/v1/conversations/{id}/clear                       - Empty the log
//! - GET    /api/v1/conversations/{id}/messages                    - Recent messages
//! - POST   /api/v1/conversations/{id}/messages                    - Append
//! - PUT    /api/v1/conversations/{id}/messages/{message_id}       - Edit content
//! - PUT    /api/v1/conversations/{id}/metadata/{key}              - Set metadata
//! - POST   /api/v1/conversations/{id}/chat                        - One chat turn
//! - GET    /api/v1/conversations/{id}/stats                       - Stats

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use switchyard_types::chat::{Conversation, ConversationStats, Message, NewMessage};
use switchyard_types::error::{GatewayError, ResourceKind};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    /// Generated (UUIDv7) when omitted.
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default = "default_message_limit")]
    pub limit: usize,
}

fn default_message_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: String,
}

/// One chat turn.
///
/// Routing comes from `provider_id`/`model_id` when given, otherwise from
/// the selection stored for `session_id`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub content: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub provider_id: String,
    pub model_id: String,
    pub message: Message,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

fn conversation_href(id: &str) -> String {
    format!("/api/v1/conversations/{id}")
}

/// POST /api/v1/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    Json(body): Json<CreateConversationRequest>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let conversation = state.gateway.conversations().create(body.id.as_deref())?;
    let href = conversation_href(&conversation.id);
    Ok(Json(
        timer
            .respond(conversation)
            .with_link("self", &href)
            .with_link("chat", &format!("{href}/chat")),
    ))
}

/// GET /api/v1/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let timer = RequestTimer::start();
    let conversations = state.gateway.conversations().list();
    Ok(Json(
        timer
            .respond(conversations)
            .with_link("self", "/api/v1/conversations"),
    ))
}

/// GET /api/v1/conversations/current
pub async fn current_conversation(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let conversation = state
        .gateway
        .conversations()
        .current()
        .ok_or_else(|| AppError::NotFound("no current conversation".to_string()))?;
    let href = conversation_href(&conversation.id);
    Ok(Json(timer.respond(conversation).with_link("self", &href)))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let conversation = state.gateway.conversations().get(&id)?;
    let href = conversation_href(&id);
    Ok(Json(
        timer
            .respond(conversation)
            .with_link("self", &href)
            .with_link("messages", &format!("{href}/messages"))
            .with_link("stats", &format!("{href}/stats")),
    ))
}

/// DELETE /api/v1/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = RequestTimer::start();
    state.gateway.conversations().delete(&id)?;
    Ok(Json(timer.respond(serde_json::json!({ "deleted": id }))))
}

/// PUT /api/v1/conversations/{id}/current
pub async fn set_current_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let store = state.gateway.conversations();
    store.set_current(&id)?;
    let conversation = store.get(&id)?;
    Ok(Json(timer.respond(conversation)))
}

/// POST /api/v1/conversations/{id}/clear
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let store = state.gateway.conversations();
    store.clear(&id)?;
    let conversation = store.get(&id)?;
    Ok(Json(timer.respond(conversation)))
}

/// GET /api/v1/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let timer = RequestTimer::start();
    let messages = state
        .gateway
        .conversations()
        .recent_messages(&id, query.limit)?;
    Ok(Json(timer.respond(messages)))
}

/// POST /api/v1/conversations/{id}/messages
///
/// Appends without calling any provider. Returns the stored message.
pub async fn append_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NewMessage>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let timer = RequestTimer::start();
    let conversation = state.gateway.conversations().append(&id, body)?;
    let message = conversation
        .messages
        .last()
        .cloned()
        .ok_or_else(|| GatewayError::not_found(ResourceKind::Message, &id))?;
    Ok(Json(
        timer
            .respond(message)
            .with_link("conversation", &conversation_href(&id)),
    ))
}

/// PUT /api/v1/conversations/{id}/messages/{message_id}
pub async fn update_message(
    State(state): State<AppState>,
    Path((id, message_id)): Path<(String, String)>,
    Json(body): Json<UpdateMessageRequest>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let timer = RequestTimer::start();
    let message_id = parse_uuid(&message_id)?;
    let message = state
        .gateway
        .conversations()
        .update_message(&id, message_id, &body.content)?;
    Ok(Json(timer.respond(message)))
}

/// PUT /api/v1/conversations/{id}/metadata/{key}
pub async fn set_metadata(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
    Json(value): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = RequestTimer::start();
    let store = state.gateway.conversations();
    store.set_metadata(&id, &key, value)?;
    Ok(Json(timer.respond(store.get(&id)?)))
}

/// POST /api/v1/conversations/{id}/chat
pub async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let timer = RequestTimer::start();
    let (provider_id, model_id) = route(&state, &body)?;

    let message = state
        .gateway
        .converse(
            &id,
            &provider_id,
            &model_id,
            &body.content,
            state.transport.clone(),
        )
        .await?;

    Ok(Json(
        timer
            .respond(ChatReply {
                provider_id,
                model_id,
                message,
            })
            .with_link("conversation", &conversation_href(&id)),
    ))
}

/// GET /api/v1/conversations/{id}/stats
pub async fn conversation_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ConversationStats>>, AppError> {
    let timer = RequestTimer::start();
    let stats = state.gateway.conversations().stats(&id)?;
    Ok(Json(timer.respond(stats)))
}

/// Pick provider and model for a chat turn.
///
/// An explicit provider wins; its model defaults to the first in the
/// catalog. Otherwise the session's selection is used, with `model_id`
/// overriding the selected model.
fn route(state: &AppState, body: &ChatRequest) -> Result<(String, String), AppError> {
    if let Some(provider_id) = &body.provider_id {
        let model_id = match &body.model_id {
            Some(model_id) => model_id.clone(),
            None => state
                .gateway
                .registry()
                .resolve(provider_id)?
                .default_model()
                .map(|m| m.id.clone())
                .ok_or_else(|| GatewayError::ModelUnavailable {
                    provider_id: provider_id.clone(),
                    model_id: "(default)".to_string(),
                })?,
        };
        return Ok((provider_id.clone(), model_id));
    }

    let session_id = body.session_id.as_deref().ok_or_else(|| {
        AppError::Validation("either provider_id or session_id is required".to_string())
    })?;
    let selection = state.gateway.selection(session_id).ok_or_else(|| {
        AppError::Validation(format!("session '{session_id}' has no provider selected"))
    })?;
    let model_id = body.model_id.clone().unwrap_or(selection.model_id);
    Ok((selection.provider_id, model_id))
}
