pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Single-turn API
        .route(
            "/api/v1/chatbot/response",
            post(handlers::handle_chatbot_response),
        )
        // Session API
        .route("/api/v1/chat/sessions", post(handlers::handle_open_session))
        .route(
            "/api/v1/chat/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route(
            "/api/v1/chat/sessions/:id/messages",
            post(handlers::handle_send_message),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::chat::conversation::WELCOME_MESSAGE;

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let router = build_router(AppState::for_tests());
        let (status, body) = call(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["open_sessions"], 0);
    }

    #[tokio::test]
    async fn test_chatbot_response_resolves_intent() {
        let router = build_router(AppState::for_tests());
        let (status, body) = call(
            &router,
            Method::POST,
            "/api/v1/chatbot/response",
            Some(json!({"message": "give me example questions for google"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "googleQuestions");
        assert_eq!(body["success"], true);
        assert!(body["response"].as_str().unwrap().contains("Google"));
    }

    #[tokio::test]
    async fn test_chatbot_response_uses_caller_context() {
        let router = build_router(AppState::for_tests());
        let (status, body) = call(
            &router,
            Method::POST,
            "/api/v1/chatbot/response",
            Some(json!({"message": "tell me more", "last_intent": "resume"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "resume");
    }

    #[tokio::test]
    async fn test_chatbot_response_rejects_empty_message() {
        let router = build_router(AppState::for_tests());
        let (status, body) = call(
            &router,
            Method::POST,
            "/api/v1/chatbot/response",
            Some(json!({"message": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_chatbot_response_rejects_unknown_last_intent() {
        let router = build_router(AppState::for_tests());
        let (status, _) = call(
            &router,
            Method::POST,
            "/api/v1/chatbot/response",
            Some(json!({"message": "more", "last_intent": "netflix"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let router = build_router(AppState::for_tests());

        let (status, opened) = call(&router, Method::POST, "/api/v1/chat/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(opened["transcript"][0]["content"], WELCOME_MESSAGE);
        assert_eq!(opened["suggestions"].as_array().unwrap().len(), 3);
        let id = opened["session_id"].as_str().unwrap().to_string();
        let messages = format!("/api/v1/chat/sessions/{id}/messages");

        let (status, turn) = call(
            &router,
            Method::POST,
            &messages,
            Some(json!({"message": "How should I prepare my resume?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(turn["intent"], "resume");
        assert_eq!(turn["reply"]["intent"], "resume");
        assert_eq!(turn["reply"]["role"], "assistant");

        let (_, turn) = call(
            &router,
            Method::POST,
            &messages,
            Some(json!({"message": "tell me more"})),
        )
        .await;
        assert_eq!(turn["intent"], "resume");

        let session_uri = format!("/api/v1/chat/sessions/{id}");
        let (status, snapshot) = call(&router, Method::GET, &session_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["last_intent"], "resume");
        assert_eq!(snapshot["transcript"].as_array().unwrap().len(), 5);

        let (status, _) = call(&router, Method::DELETE, &session_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&router, Method::GET, &session_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_greeting_reply_is_untagged() {
        let router = build_router(AppState::for_tests());
        let (_, opened) = call(&router, Method::POST, "/api/v1/chat/sessions", None).await;
        let id = opened["session_id"].as_str().unwrap();

        let (_, turn) = call(
            &router,
            Method::POST,
            &format!("/api/v1/chat/sessions/{id}/messages"),
            Some(json!({"message": "hello"})),
        )
        .await;
        assert_eq!(turn["intent"], "hello");
        assert!(turn["reply"].get("intent").is_none());
    }

    #[tokio::test]
    async fn test_message_to_unknown_session_is_not_found() {
        let router = build_router(AppState::for_tests());
        let uri = format!("/api/v1/chat/sessions/{}/messages", uuid::Uuid::new_v4());
        let (status, _) = call(&router, Method::POST, &uri, Some(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_session_message_is_rejected() {
        let router = build_router(AppState::for_tests());
        let (_, opened) = call(&router, Method::POST, "/api/v1/chat/sessions", None).await;
        let id = opened["session_id"].as_str().unwrap();
        let (status, _) = call(
            &router,
            Method::POST,
            &format!("/api/v1/chat/sessions/{id}/messages"),
            Some(json!({"message": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
