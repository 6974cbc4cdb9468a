//! Axum route handlers for the chat API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::chat::conversation::{ChatMessage, ConversationContext};
use crate::chat::intent::Intent;
use crate::chat::session::SessionSnapshot;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    #[serde(default)]
    pub message: String,
    /// Wire name of the previous turn's intent, for callers keeping their own context.
    #[serde(default)]
    pub last_intent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub response: String,
    pub intent: Intent,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub intent: Intent,
    pub reply: ChatMessage,
}

fn require_message(message: &str) -> Result<&str, AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }
    Ok(message)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chatbot/response
///
/// Single stateless turn. The caller carries the context in `last_intent`.
pub async fn handle_chatbot_response(
    State(state): State<AppState>,
    Json(request): Json<ChatbotRequest>,
) -> Result<Json<ChatbotResponse>, AppError> {
    let message = require_message(&request.message)?;
    let last_intent = request
        .last_intent
        .as_deref()
        .map(str::parse::<Intent>)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (intent, _) = ConversationContext { last_intent }.resolve(message);
    let response = state.responder.respond(intent, message)?.to_string();
    info!(%intent, "chatbot response");

    Ok(Json(ChatbotResponse {
        response,
        intent,
        success: true,
    }))
}

/// POST /api/v1/chat/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let session = state.sessions.open();
    (StatusCode::CREATED, Json(session.snapshot()))
}

/// GET /api/v1/chat/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get(id)?;
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/chat/sessions/:id/messages
///
/// Records the message, waits out the typing delay, and returns the reply.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let message = require_message(&request.message)?;
    let session = state.sessions.get(id)?;

    let outcome = session
        .take_turn(message, &state.responder, state.config.typing_delay())
        .await?;

    Ok(Json(SendMessageResponse {
        intent: outcome.intent,
        reply: outcome.reply,
    }))
}

/// DELETE /api/v1/chat/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.close(id)?;
    Ok(StatusCode::NO_CONTENT)
}
