use axum::{Json, extract::ConnectInfo, extract::State};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{ImproveRequest, ImproveResponse};
use crate::rate_limit::policies;
use crate::state::AppState;
use crate::validators::validate_code;

pub async fn improve_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<ImproveRequest>,
) -> Result<Json<ImproveResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    state.admit(addr.ip(), "improve", policies::IMPROVE)?;

    let code = payload.code.trim();
    validate_code(code).map_err(ApiError::BadRequest)?;

    let started = Instant::now();

    let improvement = state
        .gemini
        .improve_code(code, &payload.language, &payload.focus)
        .await
        .map_err(|err| ApiError::provider("Code improvement failed", err))?;

    REQUEST_LATENCY.observe(started.elapsed().as_secs_f64());

    Ok(Json(ImproveResponse {
        success: true,
        improved_code: improvement.improved_code,
        suggestions: improvement.suggestions,
    }))
}
