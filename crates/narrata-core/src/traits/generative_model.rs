use crate::errors::SynthesisError;
use crate::models::CompletionRequest;

/// A request/response generative-model service.
pub trait IGenerativeModel: Send + Sync {
    /// Send the payload and return the completion text.
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError>;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider is currently usable (e.g. has credentials).
    fn is_available(&self) -> bool {
        true
    }
}
