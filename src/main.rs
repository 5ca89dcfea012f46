use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod provider;
mod rate_limit;
mod retry;
mod state;
mod text;
mod validators;

use config::Args;
use handlers::{
    chat_handler, explain_handler, generate_handler, health_handler, improve_handler,
    index_handler, metrics_handler, models_handler,
};
use provider::GeminiClient;
use rate_limit::{RateLimiter, policies};
use retry::RetryPolicy;
use state::AppState;

#[tokio::main]
async fn main() {
    // parse cli arguments (the API key comes from GEMINI_API_KEY;
    // clap aborts startup with a clear error when it is missing)
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let retry_policy = RetryPolicy::new(
        args.max_attempts,
        Duration::from_secs(args.retry_base_delay),
    );

    let gemini = GeminiClient::new(
        args.api_base_url.clone(),
        args.api_key.clone(),
        args.model.clone(),
        args.max_output_tokens,
        retry_policy,
    );

    // creating shared state
    let state = Arc::new(AppState {
        gemini,
        rate_limiter: RateLimiter::new(),
    });

    // spawn the background sweeper that evicts idle rate-limiter
    // clients so long-gone IPs don't accumulate forever
    let sweeper_state = Arc::clone(&state);
    let sweep_every = Duration::from_secs(args.sweep_interval);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweeper_state.rate_limiter.sweep(policies::MAX_WINDOW);
            metrics::TRACKED_CLIENTS.set(sweeper_state.rate_limiter.tracked_clients() as f64);
        }
    });

    let cors = CorsLayer::new()
        .allow_origin([
            args.frontend_url.parse::<HeaderValue>().unwrap(),
            "http://localhost:3000".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    // creating the router with routes
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/explain", post(explain_handler))
        .route("/api/improve", post(improve_handler))
        .route("/api/models", get(models_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    info!("Coding chatbot API running on http://localhost:{}", args.port);
    info!("Model: {}", args.model);
    info!(
        "Retry policy: {} attempts, {}s base delay",
        args.max_attempts, args.retry_base_delay
    );
    info!("CORS enabled for: {}", args.frontend_url);

    // handlers need the peer address for rate-limit keying
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
