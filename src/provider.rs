use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::ChatMessage;
use crate::retry::{self, Retryable, RetryPolicy};
use crate::text;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound-call failures, classified so the retry wrapper knows what
/// is worth another attempt and the HTTP layer knows what to tell the
/// user.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider throttled us (HTTP 429). Transient.
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    /// The provider rejected the request as malformed (HTTP 400).
    /// Retrying the same payload cannot help.
    #[error("Invalid request. Please check your prompt.")]
    InvalidRequest,

    /// The request never completed (connect failure, timeout, broken
    /// body). Transient.
    #[error("request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any other non-success status, presumed transient overload.
    #[error("model provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// A 200 with no candidate text in it.
    #[error("model returned no usable content")]
    EmptyResponse,

    /// Produced after the retry ceiling; carries the attempt count for
    /// diagnostics.
    #[error("provider unavailable after {attempts} attempts ({message})")]
    Exhausted { attempts: u32, message: String },
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited
            | ProviderError::Transport(_)
            | ProviderError::Status { .. }
            | ProviderError::EmptyResponse => true,
            ProviderError::InvalidRequest | ProviderError::Exhausted { .. } => false,
        }
    }
}

// generateContent wire format

#[derive(Serialize, Deserialize, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part { text }],
        }
    }

    fn system(text: String) -> Self {
        Self {
            role: None,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

// operation results

pub struct GeneratedCode {
    pub code: String,
    pub language: String,
}

pub struct ChatTurn {
    pub response: String,
    pub history: Vec<ChatMessage>,
}

pub struct Improvement {
    pub improved_code: String,
    pub suggestions: String,
}

/// Client for the generative-language REST API. One method per
/// relay operation; every outbound call goes through the retry
/// wrapper with this client's policy.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_output_tokens: u32,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_output_tokens: u32,
        retry: RetryPolicy,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url,
            api_key,
            model,
            max_output_tokens,
            retry,
        }
    }

    /// Generate code for a prompt. Fences are stripped from the reply
    /// and the language is detected from the code when the caller
    /// passed `auto`.
    pub async fn generate_code(
        &self,
        prompt: &str,
        language: &str,
        temperature: f32,
    ) -> Result<GeneratedCode, ProviderError> {
        let language_line = if language == "auto" {
            String::new()
        } else {
            format!("Programming language: {language}")
        };

        let formatted_prompt = format!(
            "You are an expert software engineer. Generate high-quality, production-ready code for:\n\n\
             {prompt}\n\n\
             {language_line}\n\n\
             Requirements:\n\
             - Write clean, well-structured code\n\
             - Include helpful comments\n\
             - Follow best practices and coding standards\n\
             - Add proper error handling where appropriate\n\
             - Make the code maintainable and readable\n\n\
             Provide ONLY the code with inline comments. Do not include explanations outside the code."
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user(formatted_prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature,
                max_output_tokens: self.max_output_tokens,
                top_p: Some(0.95),
                top_k: Some(40),
            }),
        };

        let raw = self.call_with_retry(request).await?;
        let code = text::sanitize_code(&raw);
        let language = if language == "auto" {
            text::detect_language(&code).to_string()
        } else {
            language.to_string()
        };

        Ok(GeneratedCode { code, language })
    }

    /// Continue a multi-turn conversation. Prior turns are forwarded
    /// to the model; the returned history is the input history plus
    /// the new user and model turns.
    pub async fn continue_chat(
        &self,
        message: &str,
        history: &[ChatMessage],
        language: &str,
    ) -> Result<ChatTurn, ProviderError> {
        let preference = if language == "auto" {
            String::new()
        } else {
            format!("Prefer {language} when generating code.")
        };

        let system_instruction = format!(
            "You are an expert coding assistant. Help users with:\n\
             - Writing clean, efficient code\n\
             - Debugging and fixing errors\n\
             - Explaining programming concepts\n\
             - Code optimization and best practices\n\n\
             {preference}\n\n\
             Be concise but thorough. Provide code examples when helpful."
        );

        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.clone()),
                parts: vec![Part {
                    text: turn.content.clone(),
                }],
            })
            .collect();
        contents.push(Content::user(message.to_string()));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system(system_instruction)),
            generation_config: None,
        };

        let response = self.call_with_retry(request).await?;

        let mut updated = history.to_vec();
        updated.push(ChatMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });
        updated.push(ChatMessage {
            role: "model".to_string(),
            content: response.clone(),
        });

        Ok(ChatTurn {
            response,
            history: updated,
        })
    }

    /// Explain a piece of code.
    pub async fn explain_code(
        &self,
        code: &str,
        language: &str,
    ) -> Result<String, ProviderError> {
        let language_note = if language == "auto" {
            String::new()
        } else {
            format!(" (written in {language})")
        };

        let prompt = format!(
            "Analyze and explain the following code{language_note} in detail:\n\n\
             {code}\n\n\
             Provide:\n\
             1. High-level overview of what the code does\n\
             2. Step-by-step explanation of the logic\n\
             3. Any potential issues or improvements\n\
             4. Time/space complexity if applicable\n\n\
             Keep explanations clear and beginner-friendly."
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 2048,
                top_p: None,
                top_k: None,
            }),
        };

        self.call_with_retry(request).await
    }

    /// Improve a piece of code, optionally steered by a focus area.
    pub async fn improve_code(
        &self,
        code: &str,
        language: &str,
        focus: &str,
    ) -> Result<Improvement, ProviderError> {
        let focus_instruction = match focus {
            "performance" => "Focus on performance optimization and efficiency",
            "readability" => "Focus on code readability and maintainability",
            "security" => "Focus on security best practices and vulnerability fixes",
            _ => "Provide overall improvements across all aspects",
        };

        let language_note = if language == "auto" {
            String::new()
        } else {
            format!(" (written in {language})")
        };

        let prompt = format!(
            "Improve the following code{language_note}:\n\n\
             {code}\n\n\
             {focus_instruction}\n\n\
             Provide:\n\
             1. The improved version of the code\n\
             2. List of specific changes made and why\n\
             3. Best practices applied\n\n\
             Format:\n\
             IMPROVED CODE:\n\
             [improved code here]\n\n\
             CHANGES:\n\
             [list of improvements]"
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 3072,
                top_p: None,
                top_k: None,
            }),
        };

        let full_response = self.call_with_retry(request).await?;
        Ok(parse_improvement(&full_response))
    }

    /// List available models, filtered to the gemini family. Falls
    /// back to the configured model so the endpoint never fails
    /// outward.
    pub async fn list_models(&self) -> Vec<String> {
        match retry::execute(&self.retry, || self.fetch_models()).await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => vec![self.model.clone()],
            Err(err) => {
                tracing::warn!("model listing failed, using configured model: {}", err);
                vec![self.model.clone()]
            }
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body: ModelList = response.json().await?;

        Ok(body
            .models
            .into_iter()
            .map(|model| model.name)
            .filter(|name| name.to_lowercase().contains("gemini"))
            .collect())
    }

    /// One generateContent call, retried per this client's policy.
    /// Retryable failures that survive the ceiling come back as
    /// `Exhausted`, except a provider throttle which keeps its own
    /// meaning all the way to the user.
    async fn call_with_retry(
        &self,
        request: GenerateContentRequest,
    ) -> Result<String, ProviderError> {
        retry::execute(&self.retry, || self.generate_content(&request))
            .await
            .map_err(|err| match err {
                ProviderError::RateLimited => ProviderError::RateLimited,
                err if err.is_retryable() => ProviderError::Exhausted {
                    attempts: self.retry.max_attempts,
                    message: err.to_string(),
                },
                err => err,
            })
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body: GenerateContentResponse = response.json().await?;

        body.candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .map(|part| part.text)
            .reduce(|mut acc, text| {
                acc.push_str(&text);
                acc
            })
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if status == StatusCode::BAD_REQUEST {
            return Err(ProviderError::InvalidRequest);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: snippet(&message),
            });
        }

        Ok(response)
    }
}

/// Split an improve-code reply on the CHANGES: marker the prompt asked
/// for. Models don't always comply, so the marker may be missing.
fn parse_improvement(full_response: &str) -> Improvement {
    match full_response.split_once("CHANGES:") {
        Some((code_part, changes)) => Improvement {
            improved_code: code_part.replace("IMPROVED CODE:", "").trim().to_string(),
            suggestions: changes.trim().to_string(),
        },
        None => Improvement {
            improved_code: full_response
                .replace("IMPROVED CODE:", "")
                .trim()
                .to_string(),
            suggestions: "See improved code above".to_string(),
        },
    }
}

fn snippet(message: &str) -> String {
    message.chars().take(200).collect()
}
