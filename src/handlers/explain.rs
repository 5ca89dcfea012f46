use axum::{Json, extract::ConnectInfo, extract::State};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{ExplainRequest, ExplainResponse};
use crate::rate_limit::policies;
use crate::state::AppState;
use crate::validators::validate_code;

pub async fn explain_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<ExplainRequest>,
) -> Result<Json<ExplainResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    state.admit(addr.ip(), "explain", policies::EXPLAIN)?;

    let code = payload.code.trim();
    validate_code(code).map_err(ApiError::BadRequest)?;

    let started = Instant::now();

    let explanation = state
        .gemini
        .explain_code(code, &payload.language)
        .await
        .map_err(|err| ApiError::provider("Explanation failed", err))?;

    REQUEST_LATENCY.observe(started.elapsed().as_secs_f64());

    Ok(Json(ExplainResponse {
        success: true,
        explanation,
    }))
}
