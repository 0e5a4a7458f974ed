use std::fmt;

use serde::{Deserialize, Serialize};

/// Content-derived cache key of an outbound generative request (blake3, hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed hex digest (e.g. read back from storage).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// The exact payload sent to the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Retry attempt number. Set only on retries so each retry gets its own
    /// fingerprint instead of replaying a cached failure.
    pub attempt: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            max_tokens: None,
            attempt: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Mark the request as retry `attempt` (0-based). Attempt 0 leaves the
    /// fingerprint untouched.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = (attempt > 0).then_some(attempt);
        self
    }

    /// Deterministic hash over every field that affects the completion.
    ///
    /// Each field is length-prefixed so no two distinct payloads can
    /// concatenate to the same byte stream.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        hash_field(&mut hasher, self.model.as_bytes());
        hasher.update(&self.temperature.to_bits().to_le_bytes());
        match self.max_tokens {
            Some(n) => {
                hasher.update(&[1]);
                hasher.update(&n.to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        match self.attempt {
            Some(n) => {
                hasher.update(&[1]);
                hasher.update(&n.to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.update(&(self.messages.len() as u64).to_le_bytes());
        for message in &self.messages {
            hash_field(&mut hasher, message.role.as_str().as_bytes());
            hash_field(&mut hasher, message.content.as_bytes());
        }
        Fingerprint(hasher.finalize().to_hex().to_string())
    }

    /// Total characters across all message contents.
    pub fn prompt_chars(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }
}

fn hash_field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// A completion as seen by a pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub fingerprint: Fingerprint,
    /// Served from the response cache without calling the model.
    pub cache_hit: bool,
}
