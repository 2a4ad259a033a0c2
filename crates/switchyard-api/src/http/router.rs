//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`, except the liveness probe at `/health`.
//! Middleware: CORS, tracing.

use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Provider catalog
        .route(
            "/providers",
            get(handlers::provider::list_providers).post(handlers::provider::register_provider),
        )
        .route(
            "/providers/health",
            get(handlers::provider::all_provider_health),
        )
        .route("/providers/{id}", get(handlers::provider::get_provider))
        .route(
            "/providers/{id}/activate",
            post(handlers::provider::activate_provider),
        )
        .route(
            "/providers/{id}/deactivate",
            post(handlers::provider::deactivate_provider),
        )
        .route(
            "/providers/{id}/status",
            get(handlers::provider::provider_status),
        )
        .route(
            "/providers/{id}/health",
            get(handlers::provider::provider_health),
        )
        .route(
            "/providers/{id}/rate-limit",
            get(handlers::provider::provider_rate_limit),
        )
        .route("/providers/{id}/models", post(handlers::provider::add_model))
        .route(
            "/providers/{id}/models/{model_id}",
            delete(handlers::provider::remove_model),
        )
        // Session routing
        .route(
            "/sessions/{id}/selection",
            get(handlers::session::get_selection).put(handlers::session::select_provider),
        )
        // Conversations
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations)
                .post(handlers::conversation::create_conversation),
        )
        .route(
            "/conversations/current",
            get(handlers::conversation::current_conversation),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation)
                .delete(handlers::conversation::delete_conversation),
        )
        .route(
            "/conversations/{id}/current",
            put(handlers::conversation::set_current_conversation),
        )
        .route(
            "/conversations/{id}/clear",
            post(handlers::conversation::clear_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::conversation::list_messages)
                .post(handlers::conversation::append_message),
        )
        .route(
            "/conversations/{id}/messages/{message_id}",
            put(handlers::conversation::update_message),
        )
        .route(
            "/conversations/{id}/metadata/{key}",
            put(handlers::conversation::set_metadata),
        )
        .route(
            "/conversations/{id}/chat",
            post(handlers::conversation::chat),
        )
        .route(
            "/conversations/{id}/stats",
            get(handlers::conversation::conversation_stats),
        )
        // Cache
        .route("/cache", delete(handlers::cache::clear_cache))
        .route("/cache/stats", get(handlers::cache::cache_stats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let registry = state.gateway.registry();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": registry.len(),
        "active_providers": registry.list_active().len(),
    }))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use switchyard_types::config::GatewayConfig;

    use super::*;

    fn test_state() -> AppState {
        AppState::from_config(GatewayConfig::default(), PathBuf::from("config.toml")).unwrap()
    }

    async fn call(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = test_state();
        let (status, body) = call(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["providers"], 3);
        assert_eq!(body["active_providers"], 2);
    }

    #[tokio::test]
    async fn test_list_providers_in_envelope() {
        let state = test_state();
        let (status, body) = call(&state, Method::GET, "/api/v1/providers?active=true", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["anthropic", "groq"]);
        assert!(body["meta"]["request_id"].as_str().is_some());
        assert_eq!(body["_links"]["self"], "/api/v1/providers");
    }

    #[tokio::test]
    async fn test_unknown_provider_is_404() {
        let state = test_state();
        let (status, body) =
            call(&state, Method::GET, "/api/v1/providers/nope/rate-limit", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "NOT_FOUND");
        assert_eq!(body["errors"][0]["details"]["kind"], "provider");
    }

    #[tokio::test]
    async fn test_rate_limit_view_for_fresh_provider() {
        let state = test_state();
        let (status, body) =
            call(&state, Method::GET, "/api/v1/providers/groq/rate-limit", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["info"]["limit"], 30);
        assert_eq!(body["data"]["info"]["remaining"], 30);
    }

    #[tokio::test]
    async fn test_selection_of_inactive_provider_conflicts_until_activated() {
        let state = test_state();
        let uri = "/api/v1/sessions/s1/selection";

        let (status, body) =
            call(&state, Method::PUT, uri, Some(json!({ "provider_id": "openai" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"][0]["code"], "PROVIDER_INACTIVE");

        let (status, body) =
            call(&state, Method::POST, "/api/v1/providers/openai/activate", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_active"], true);

        let (status, body) =
            call(&state, Method::PUT, uri, Some(json!({ "provider_id": "openai" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["model_id"], "gpt-4");

        let (status, body) = call(&state, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["provider_id"], "openai");
    }

    #[tokio::test]
    async fn test_missing_selection_is_404() {
        let state = test_state();
        let (status, _) = call(&state, Method::GET, "/api/v1/sessions/none/selection", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_conversation_lifecycle() {
        let state = test_state();

        let (status, body) =
            call(&state, Method::POST, "/api/v1/conversations", Some(json!({ "id": "c1" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "c1");

        let (status, _) =
            call(&state, Method::POST, "/api/v1/conversations", Some(json!({ "id": "c1" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/conversations/c1/messages",
            Some(json!({ "role": "user", "content": "hello there" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let message_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &state,
            Method::PUT,
            &format!("/api/v1/conversations/c1/messages/{message_id}"),
            Some(json!({ "content": "hello again" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["content"], "hello again");
        assert_eq!(body["data"]["id"], message_id.as_str());

        let (status, body) =
            call(&state, Method::GET, "/api/v1/conversations/c1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message_count"], 1);
        assert_eq!(body["data"]["approx_token_count"], 3);

        let (status, body) =
            call(&state, Method::POST, "/api/v1/conversations/c1/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["messages"].as_array().unwrap().len(), 0);

        let (status, _) = call(&state, Method::DELETE, "/api/v1/conversations/c1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&state, Method::GET, "/api/v1/conversations/c1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_message_reports_every_violation() {
        let state = test_state();
        call(&state, Method::POST, "/api/v1/conversations", Some(json!({ "id": "c2" }))).await;

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/v1/conversations/c2/messages",
            Some(json!({ "role": "robot", "content": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"][0]["details"]["violations"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_bad_message_id_is_400() {
        let state = test_state();
        call(&state, Method::POST, "/api/v1/conversations", Some(json!({ "id": "c3" }))).await;
        let (status, body) = call(
            &state,
            Method::PUT,
            "/api/v1/conversations/c3/messages/not-a-uuid",
            Some(json!({ "content": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_chat_without_routing_is_rejected() {
        let state = test_state();
        call(&state, Method::POST, "/api/v1/conversations", Some(json!({ "id": "c4" }))).await;
        let (status, _) = call(
            &state,
            Method::POST,
            "/api/v1/conversations/c4/chat",
            Some(json!({ "content": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Inactive provider is refused before anything is appended.
        let (status, _) = call(
            &state,
            Method::POST,
            "/api/v1/conversations/c4/chat",
            Some(json!({ "content": "hi", "provider_id": "openai" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let conversation = state.gateway.conversations().get("c4").unwrap();
        assert!(conversation.messages.is_empty());
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let state = test_state();
        let (status, body) = call(&state, Method::GET, "/api/v1/cache/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["capacity"], 500);
        assert_eq!(body["data"]["entries"], 0);
    }
}
