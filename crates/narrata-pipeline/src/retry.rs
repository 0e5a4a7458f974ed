//! Opt-in bounded retry for the generative stages.

use narrata_core::errors::SynthesisError;

/// How many times a generative stage may be attempted.
///
/// The default is a single attempt. Every retry is sent with a new attempt
/// number, which changes the request fingerprint, so a retry is never
/// answered from the cache entry of the attempt it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_attempts: 1 }
    }

    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether to try again after `attempt` (zero-based) failed with `error`.
    pub fn should_retry(&self, attempt: u32, error: &SynthesisError) -> bool {
        attempt + 1 < self.max_attempts && error.is_transient()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> SynthesisError {
        SynthesisError::ModelUnavailable {
            provider: "p".into(),
            reason: "down".into(),
        }
    }

    #[test]
    fn default_never_retries() {
        assert!(!RetryPolicy::default().should_retry(0, &unavailable()));
    }

    #[test]
    fn bounded_by_max_attempts() {
        let policy = RetryPolicy::new(3);
        assert!(policy.should_retry(0, &unavailable()));
        assert!(policy.should_retry(1, &unavailable()));
        assert!(!policy.should_retry(2, &unavailable()));
    }

    #[test]
    fn oversized_prompts_are_not_retried() {
        let err = SynthesisError::PromptTooLarge {
            chars: 10,
            reason: "limit".into(),
        };
        assert!(!RetryPolicy::new(5).should_retry(0, &err));
    }

    #[test]
    fn zero_is_clamped_to_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }
}
