//! Result rows → narrative text.

use std::collections::BTreeMap;

use tracing::debug;

use narrata_core::config::ModelConfig;
use narrata_core::constants::{INDICATOR_PARAM, TASK_NARRATION};
use narrata_core::errors::SynthesisError;
use narrata_core::models::{
    CompletionRequest, NarrativeResponse, QueryResult, RunTrace, SynthesizedQuery,
};
use narrata_llm::CachedModel;

use crate::prompts::narrative::NarrationPrompt;

pub struct NarrativeGenerator {
    model: CachedModel,
    model_config: ModelConfig,
    max_rows: usize,
    indicator_names: BTreeMap<String, String>,
}

impl NarrativeGenerator {
    pub fn new(
        model: CachedModel,
        model_config: ModelConfig,
        max_rows: usize,
        indicator_names: BTreeMap<String, String>,
    ) -> Self {
        Self {
            model,
            model_config,
            max_rows,
            indicator_names,
        }
    }

    /// Rows the narration may see: at most `max_rows`, truncation flagged.
    pub fn snapshot(&self, result: &QueryResult) -> QueryResult {
        let mut snapshot = result.clone();
        snapshot.truncate_keeping_latest(self.max_rows);
        snapshot
    }

    /// The exact outbound request for one attempt. `result` must already be capped.
    pub fn build_request(
        &self,
        question: &str,
        query: &SynthesizedQuery,
        result: &QueryResult,
        attempt: u32,
    ) -> CompletionRequest {
        let prompt = NarrationPrompt {
            query: &query.text,
            result,
            indicator_name: self.indicator_name(query),
        };
        CompletionRequest::new(
            self.model_config.model.clone(),
            prompt.build_messages(question),
            self.model_config.temperature,
        )
        .with_max_tokens(self.model_config.max_tokens)
        .with_attempt(attempt)
    }

    pub fn narrate(
        &self,
        question: &str,
        query: &SynthesizedQuery,
        result: &QueryResult,
        attempt: u32,
    ) -> Result<NarrativeResponse, SynthesisError> {
        let snapshot = self.snapshot(result);
        let request = self.build_request(question, query, &snapshot, attempt);
        let completion = self.model.complete(&request, TASK_NARRATION)?;
        debug!(
            fingerprint = completion.fingerprint.short(),
            cache_hit = completion.cache_hit,
            rows = snapshot.row_count(),
            truncated = snapshot.truncated,
            "narrative generated"
        );
        Ok(NarrativeResponse {
            text: completion.text.trim().to_string(),
            query: query.clone(),
            result: snapshot,
            trace: RunTrace {
                narration_fingerprint: Some(completion.fingerprint),
                narration_cache_hit: completion.cache_hit,
                ..RunTrace::default()
            },
        })
    }

    fn indicator_name(&self, query: &SynthesizedQuery) -> Option<&str> {
        let code = query.bindings.get(INDICATOR_PARAM)?.as_str()?;
        self.indicator_names.get(code).map(String::as_str)
    }
}
