use axum::{Json, response::IntoResponse};

// health handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "codebot-api",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// service banner with the endpoint map
pub async fn index_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "Coding Chatbot API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "metrics": "/metrics",
            "generate": "/api/generate",
            "chat": "/api/chat",
            "explain": "/api/explain",
            "improve": "/api/improve",
            "models": "/api/models"
        }
    }))
}
