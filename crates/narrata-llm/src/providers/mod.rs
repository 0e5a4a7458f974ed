//! Provider registry.
//!
//! - `openai`: any OpenAI-compatible chat-completions endpoint.
//! - `ollama`: a local Ollama server.

pub mod ollama_provider;
pub mod openai_provider;

pub use ollama_provider::OllamaProvider;
pub use openai_provider::OpenAiCompatibleProvider;

use std::time::Duration;

use tracing::{info, warn};

use narrata_core::config::defaults::{DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OPENAI_ENDPOINT};
use narrata_core::config::ModelConfig;
use narrata_core::errors::{ConfigError, NarrataResult, SynthesisError};
use narrata_core::traits::IGenerativeModel;

/// Create the configured provider, boxed.
///
/// An unknown provider is a configuration error. A provider that is known but
/// unusable (e.g. missing API key) is still returned; it reports
/// `is_available() == false` and fails calls with `ModelUnavailable`.
pub fn create_provider(config: &ModelConfig) -> NarrataResult<Box<dyn IGenerativeModel>> {
    let provider: Box<dyn IGenerativeModel> = match config.provider.as_str() {
        "openai" => Box::new(OpenAiCompatibleProvider::from_config(config)),
        "ollama" => {
            let base_url = if config.endpoint == DEFAULT_OPENAI_ENDPOINT {
                DEFAULT_OLLAMA_ENDPOINT.to_string()
            } else {
                config.endpoint.clone()
            };
            Box::new(OllamaProvider::new(
                base_url,
                config.max_tokens,
                Duration::from_secs(config.request_timeout_secs),
            ))
        }
        other => {
            return Err(ConfigError::InvalidValue {
                field: "model.provider".to_string(),
                message: format!("unknown provider '{other}'"),
            }
            .into())
        }
    };

    if provider.is_available() {
        info!(provider = provider.name(), model = %config.model, "generative provider ready");
    } else {
        warn!(provider = provider.name(), "generative provider configured but unavailable");
    }
    Ok(provider)
}

/// Map a transport failure to the generative error taxonomy.
pub(crate) fn transport_err(provider: &str, err: &reqwest::Error, elapsed: Duration) -> SynthesisError {
    if err.is_timeout() {
        SynthesisError::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
        }
    } else {
        SynthesisError::ModelUnavailable {
            provider: provider.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Map a non-success HTTP status. Oversized prompts are reported as such so the
/// caller does not retry them.
pub(crate) fn status_err(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
    prompt_chars: usize,
) -> SynthesisError {
    let context_overflow = body.contains("context_length") || body.contains("maximum context");
    if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE || context_overflow {
        SynthesisError::PromptTooLarge {
            chars: prompt_chars,
            reason: format!("{provider} returned {status}"),
        }
    } else {
        SynthesisError::ModelUnavailable {
            provider: provider.to_string(),
            reason: format!("{status}: {}", truncate_body(body)),
        }
    }
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
