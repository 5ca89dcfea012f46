use axum::{Json, extract::ConnectInfo, extract::State};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{ChatRequest, ChatResponse, execution_secs};
use crate::rate_limit::policies;
use crate::state::AppState;

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    state.admit(addr.ip(), "chat", policies::CHAT)?;

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".to_string()));
    }

    let started = Instant::now();

    let turn = state
        .gemini
        .continue_chat(message, &payload.history, &payload.language)
        .await
        .map_err(|err| ApiError::provider("Chat failed", err))?;

    REQUEST_LATENCY.observe(started.elapsed().as_secs_f64());

    Ok(Json(ChatResponse {
        success: true,
        response: turn.response,
        history: turn.history,
        execution_time: execution_secs(started),
    }))
}
