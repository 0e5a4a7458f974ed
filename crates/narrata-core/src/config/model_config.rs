use serde::{Deserialize, Serialize};

use super::defaults;

/// Generative-model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Provider: "openai" (any OpenAI-compatible chat endpoint) or "ollama".
    pub provider: String,
    /// Model identifier sent with every request. Part of the fingerprint.
    pub model: String,
    /// Endpoint URL. For "ollama" this is the server base URL.
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature. Part of the fingerprint.
    pub temperature: f32,
    /// Optional completion token limit. Part of the fingerprint.
    pub max_tokens: Option<u32>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: defaults::DEFAULT_PROVIDER.to_string(),
            model: defaults::DEFAULT_MODEL.to_string(),
            endpoint: defaults::DEFAULT_OPENAI_ENDPOINT.to_string(),
            api_key_env: defaults::DEFAULT_API_KEY_ENV.to_string(),
            temperature: defaults::DEFAULT_TEMPERATURE,
            max_tokens: None,
            request_timeout_secs: defaults::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}
