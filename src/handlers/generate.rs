use axum::{Json, extract::ConnectInfo, extract::State};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{GenerateRequest, GenerateResponse, execution_secs};
use crate::rate_limit::policies;
use crate::state::AppState;
use crate::validators::validate_prompt;

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    state.admit(addr.ip(), "generate", policies::GENERATE)?;

    let prompt = payload.prompt.trim();
    validate_prompt(prompt, payload.temperature).map_err(ApiError::BadRequest)?;

    let started = Instant::now();

    let generated = state
        .gemini
        .generate_code(prompt, &payload.language, payload.temperature)
        .await
        .map_err(|err| ApiError::provider("Code generation failed", err))?;

    REQUEST_LATENCY.observe(started.elapsed().as_secs_f64());

    Ok(Json(GenerateResponse {
        success: true,
        code: generated.code,
        language: generated.language,
        execution_time: execution_secs(started),
    }))
}
