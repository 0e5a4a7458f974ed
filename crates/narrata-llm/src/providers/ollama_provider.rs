//! Ollama local chat provider (`POST /api/chat`, non-streaming).

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use narrata_core::errors::SynthesisError;
use narrata_core::models::CompletionRequest;
use narrata_core::traits::IGenerativeModel;

use super::{status_err, transport_err};

const PROVIDER: &str = "ollama";

pub struct OllamaProvider {
    base_url: String,
    max_tokens: Option<u32>,
    timeout: Duration,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaReply>,
}

#[derive(Deserialize)]
struct OllamaReply {
    #[serde(default)]
    content: String,
}

impl OllamaProvider {
    /// `base_url` is the server root, e.g. `http://localhost:11434`.
    pub fn new(
        base_url: impl Into<String>,
        max_tokens: Option<u32>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_tokens,
            timeout,
        }
    }
}

impl IGenerativeModel for OllamaProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens.or(self.max_tokens),
            },
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
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| transport_err(PROVIDER, &e, started.elapsed()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(status_err(PROVIDER, status, &text, request.prompt_chars()));
        }

        let parsed: OllamaChatResponse =
            response.json().map_err(|e| SynthesisError::MalformedCompletion {
                reason: format!("unreadable Ollama response: {e}"),
            })?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Ollama completion received");

        parsed
            .message
            .map(|m| m.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| SynthesisError::MalformedCompletion {
                reason: "Ollama reply has no content".to_string(),
            })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
