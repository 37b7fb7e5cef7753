//! Help chat endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::chat::bot_response;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: &'static str,
}

/// `POST /api/chat` — keyword-matched canned answer. No auth.
pub async fn send(body: Option<Json<ChatRequest>>) -> Json<ChatResponse> {
    let message = body.and_then(|Json(req)| req.message).unwrap_or_default();
    Json(ChatResponse {
        response: bot_response(&message),
    })
}
