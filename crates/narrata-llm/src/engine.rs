//! CachedModel: every generative call goes through the response cache.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use narrata_core::errors::SynthesisError;
use narrata_core::models::{CacheEntry, Completion, CompletionRequest};
use narrata_core::traits::{IGenerativeModel, IResponseCache};

/// A generative model fronted by a content-addressed cache.
///
/// A cache entry is written only after the model call has fully returned a
/// usable completion, so an abandoned or failed call never leaves a partial
/// entry behind.
#[derive(Clone)]
pub struct CachedModel {
    model: Arc<dyn IGenerativeModel>,
    cache: Arc<dyn IResponseCache>,
    max_prompt_chars: Option<usize>,
}

impl CachedModel {
    pub fn new(model: Arc<dyn IGenerativeModel>, cache: Arc<dyn IResponseCache>) -> Self {
        Self {
            model,
            cache,
            max_prompt_chars: None,
        }
    }

    /// Refuse prompts longer than `max_chars` before they reach the model.
    pub fn with_prompt_budget(mut self, max_chars: usize) -> Self {
        self.max_prompt_chars = Some(max_chars);
        self
    }

    /// Serve `request` from the cache, or call the model and record the result
    /// under `task_label`.
    pub fn complete(
        &self,
        request: &CompletionRequest,
        task_label: &str,
    ) -> Result<Completion, SynthesisError> {
        let fingerprint = request.fingerprint();

        if let Some(entry) = self.cache.get(&fingerprint) {
            debug!(fingerprint = fingerprint.short(), task = task_label, "completion served from cache");
            return Ok(Completion {
                text: entry.text,
                fingerprint,
                cache_hit: true,
            });
        }

        let chars = request.prompt_chars();
        if let Some(max) = self.max_prompt_chars {
            if chars > max {
                return Err(SynthesisError::PromptTooLarge {
                    chars,
                    reason: format!("exceeds configured limit of {max} chars"),
                });
            }
        }

        if !self.model.is_available() {
            return Err(SynthesisError::ModelUnavailable {
                provider: self.model.name().to_string(),
                reason: "provider is not available".to_string(),
            });
        }

        let started = Instant::now();
        let text = self.model.complete(request)?;
        if text.trim().is_empty() {
            return Err(SynthesisError::MalformedCompletion {
                reason: "empty completion".to_string(),
            });
        }

        self.cache.put(CacheEntry::new(
            fingerprint.clone(),
            text.clone(),
            request.model.clone(),
            task_label,
        ));
        info!(
            fingerprint = fingerprint.short(),
            task = task_label,
            provider = self.model.name(),
            prompt_chars = chars,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion generated"
        );

        Ok(Completion {
            text,
            fingerprint,
            cache_hit: false,
        })
    }

    /// Provider name, for run traces.
    pub fn provider_name(&self) -> &str {
        self.model.name()
    }

    pub fn cache(&self) -> &Arc<dyn IResponseCache> {
        &self.cache
    }
}
