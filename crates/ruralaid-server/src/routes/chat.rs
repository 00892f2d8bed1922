//! Chat routes — sessions, turns and feedback.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use ruralaid_chat::{Attachment, Feedback, TurnOutcome};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", axum::routing::delete(delete_session))
        .route("/sessions/{id}/messages", get(get_messages))
        .route("/chat", post(chat))
        .route("/chat/feedback", post(feedback))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    attachment: Option<Attachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackRequest {
    session_id: String,
    message_id: String,
    feedback: Feedback,
}

fn not_found(session_id: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": format!("Unknown session: {}", session_id),
        })),
    )
}

// ---------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------

/// POST /api/sessions — start a conversation.
async fn create_session(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let conversation = state.sessions.create();
    Json(serde_json::json!({ "sessionId": conversation.session_id() }))
}

/// DELETE /api/sessions/{id}
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "removed": state.sessions.remove(&id) }))
}

/// GET /api/sessions/{id}/messages
async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.sessions.get(&id) {
        Some(conversation) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sessionId": conversation.session_id(),
                "messages": conversation.messages(),
            })),
        ),
        None => not_found(&id),
    }
}

// ---------------------------------------------------------------
// Turns
// ---------------------------------------------------------------

/// POST /api/chat — run one turn.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Message must not be empty" })),
        );
    }

    let conversation = state.sessions.get_or_create(req.session_id.as_deref());

    match conversation.submit(&req.message, req.attachment).await {
        TurnOutcome::Replied(reply) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sessionId": conversation.session_id(),
                "reply": reply,
            })),
        ),
        TurnOutcome::Busy => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "sessionId": conversation.session_id(),
                "error": "A previous message is still being answered",
            })),
        ),
    }
}

/// POST /api/chat/feedback — flag an assistant reply.
async fn feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedbackRequest>,
) -> impl IntoResponse {
    match state.sessions.get(&req.session_id) {
        Some(conversation) => {
            let updated = conversation.set_feedback(&req.message_id, req.feedback);
            (
                StatusCode::OK,
                Json(serde_json::json!({ "updated": updated })),
            )
        }
        None => not_found(&req.session_id),
    }
}
