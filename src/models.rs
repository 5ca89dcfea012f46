use serde::{Deserialize, Serialize};
use std::time::Instant;

// /api/generate request format
#[derive(Deserialize, Clone)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub code: String,
    pub language: String,
    pub execution_time: f64,
}

/// One turn of a conversation, role is "user" or "model".
#[derive(Deserialize, Serialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize, Clone)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub history: Vec<ChatMessage>,
    pub execution_time: f64,
}

#[derive(Deserialize, Clone)]
pub struct ExplainRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Serialize)]
pub struct ExplainResponse {
    pub success: bool,
    pub explanation: String,
}

#[derive(Deserialize, Clone)]
pub struct ImproveRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_focus")]
    pub focus: String,
}

#[derive(Serialize)]
pub struct ImproveResponse {
    pub success: bool,
    pub improved_code: String,
    pub suggestions: String,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub success: bool,
    pub models: Vec<String>,
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_focus() -> String {
    "general".to_string()
}

/// Wall-clock seconds since `started`, rounded to two decimals the
/// way responses report it.
pub fn execution_secs(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 100.0).round() / 100.0
}
