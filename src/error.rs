use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::provider::ProviderError;

/// Request-scoped failures. Every variant crosses the boundary as
/// `{"success": false, "error": <message>}` with a mapped status;
/// nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The admission controller denied the request.
    #[error("Rate limit exceeded. Maximum {max_requests} requests per {window_secs} seconds.")]
    RateLimited { max_requests: u32, window_secs: u64 },

    /// Local input validation failed; nothing was sent upstream.
    #[error("{0}")]
    BadRequest(String),

    /// The outbound model call failed. `context` names the operation
    /// for the generic-failure message.
    #[error("{context}: {source}")]
    Provider {
        context: &'static str,
        source: ProviderError,
    },
}

impl ApiError {
    pub fn provider(context: &'static str, source: ProviderError) -> Self {
        Self::Provider { context, source }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider { source, .. } => match source {
                ProviderError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                ProviderError::InvalidRequest => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            // provider-side throttle and bad-request conditions keep
            // their own user-facing wording, without the context prefix
            ApiError::Provider {
                source: source @ (ProviderError::RateLimited | ProviderError::InvalidRequest),
                ..
            } => source.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message(),
        }));
        (self.status(), body).into_response()
    }
}
