use std::net::IpAddr;

use crate::error::ApiError;
use crate::metrics::RATE_LIMITED_TOTAL;
use crate::provider::GeminiClient;
use crate::rate_limit::{Policy, RateLimiter};

// app's shared state, built once at startup and injected into every
// handler via axum state
pub struct AppState {
    pub gemini: GeminiClient,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Admission gate used by every protected handler. The limiter is
    /// keyed by client IP plus operation name so each endpoint tracks
    /// its own quota per client.
    pub fn admit(&self, ip: IpAddr, operation: &str, policy: Policy) -> Result<(), ApiError> {
        let key = format!("{}:{}", ip, operation);

        if self.rate_limiter.allow(&key, policy) {
            return Ok(());
        }

        RATE_LIMITED_TOTAL.inc();
        tracing::warn!("rate limit hit for {} on {}", ip, operation);

        Err(ApiError::RateLimited {
            max_requests: policy.max_requests,
            window_secs: policy.window_secs(),
        })
    }
}
