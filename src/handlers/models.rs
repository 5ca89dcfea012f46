use axum::{Json, extract::State};
use std::sync::Arc;

use crate::metrics::REQUEST_TOTAL;
use crate::models::ModelsResponse;
use crate::state::AppState;

// unbounded: listing models costs nothing compared to generation
pub async fn models_handler(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    REQUEST_TOTAL.inc();

    let models = state.gemini.list_models().await;

    Json(ModelsResponse {
        success: true,
        models,
    })
}
