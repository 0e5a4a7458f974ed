//! OpenAI-compatible chat-completions provider.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use narrata_core::config::ModelConfig;
use narrata_core::errors::SynthesisError;
use narrata_core::models::CompletionRequest;
use narrata_core::traits::IGenerativeModel;

use super::{status_err, transport_err};

const PROVIDER: &str = "openai";

/// Blocking client for `POST {endpoint}` with the chat-completions schema.
pub struct OpenAiCompatibleProvider {
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Reads the API key from the environment variable named by `api_key_env`, once.
    pub fn from_config(config: &ModelConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            endpoint: config.endpoint.clone(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Use an explicit key instead of the environment.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl IGenerativeModel for OpenAiCompatibleProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SynthesisError::ModelUnavailable {
                provider: PROVIDER.to_string(),
                reason: format!("{} is not set", self.api_key_env),
            })?;

        let body = ChatRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SynthesisError::ModelUnavailable {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let started = Instant::now();
        let response = client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| transport_err(PROVIDER, &e, started.elapsed()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(status_err(PROVIDER, status, &text, request.prompt_chars()));
        }

        let parsed: ChatResponse = response.json().map_err(|e| SynthesisError::MalformedCompletion {
            reason: format!("unreadable chat response: {e}"),
        })?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "chat completion received");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| SynthesisError::MalformedCompletion {
                reason: "completion has no content".to_string(),
            })
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}
