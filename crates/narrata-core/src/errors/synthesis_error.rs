/// Failures of the generative stages (query synthesis and narration).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    #[error("model unavailable: {provider}: {reason}")]
    ModelUnavailable { provider: String, reason: String },

    #[error("malformed completion: {reason}")]
    MalformedCompletion { reason: String },

    #[error("prompt too large ({chars} chars): {reason}")]
    PromptTooLarge { chars: usize, reason: String },

    #[error("generative call timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },
}

/// Field-less discriminant of [`SynthesisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthesisErrorKind {
    ModelUnavailable,
    MalformedCompletion,
    PromptTooLarge,
    Timeout,
}

impl SynthesisError {
    pub fn kind(&self) -> SynthesisErrorKind {
        match self {
            Self::ModelUnavailable { .. } => SynthesisErrorKind::ModelUnavailable,
            Self::MalformedCompletion { .. } => SynthesisErrorKind::MalformedCompletion,
            Self::PromptTooLarge { .. } => SynthesisErrorKind::PromptTooLarge,
            Self::Timeout { .. } => SynthesisErrorKind::Timeout,
        }
    }

    /// Whether a fresh attempt could plausibly succeed.
    /// An oversized prompt is deterministic, so retrying it is pointless.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::PromptTooLarge { .. })
    }
}
