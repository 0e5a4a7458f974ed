//! Question → query text, grounded in the schema and optional sample rows.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use narrata_core::config::ModelConfig;
use narrata_core::constants::{INDICATOR_PARAM, TASK_SQL_SYNTHESIS};
use narrata_core::errors::SynthesisError;
use narrata_core::models::{
    CompletionRequest, QueryResult, ScalarValue, SchemaDescriptor, SynthesizedQuery,
};
use narrata_llm::CachedModel;

use crate::completion::parse_query_completion;
use crate::prompts::synthesis::SynthesisPrompt;

pub struct QuerySynthesizer {
    model: CachedModel,
    model_config: ModelConfig,
    dataset_description: String,
    reference_date: Option<NaiveDate>,
}

impl QuerySynthesizer {
    pub fn new(
        model: CachedModel,
        model_config: ModelConfig,
        dataset_description: impl Into<String>,
        reference_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            model,
            model_config,
            dataset_description: dataset_description.into(),
            reference_date,
        }
    }

    /// The exact outbound request for one attempt.
    pub fn build_request(
        &self,
        question: &str,
        schema: &SchemaDescriptor,
        sample: Option<&QueryResult>,
        parameterized_indicator: bool,
        attempt: u32,
    ) -> CompletionRequest {
        let prompt = SynthesisPrompt {
            schema,
            dataset_description: &self.dataset_description,
            sample,
            current_date: self.reference_date.unwrap_or_else(|| Utc::now().date_naive()),
            parameterized_indicator,
        };
        CompletionRequest::new(
            self.model_config.model.clone(),
            prompt.build_messages(question),
            self.model_config.temperature,
        )
        .with_max_tokens(self.model_config.max_tokens)
        .with_attempt(attempt)
    }

    /// Ask the model for a query answering `question`.
    ///
    /// A completion that yields no query is evicted from the cache so the same
    /// prompt is not answered with it again.
    pub fn synthesize(
        &self,
        question: &str,
        schema: &SchemaDescriptor,
        sample: Option<&QueryResult>,
        bindings: &BTreeMap<String, ScalarValue>,
        attempt: u32,
    ) -> Result<SynthesizedQuery, SynthesisError> {
        let parameterized = bindings.contains_key(INDICATOR_PARAM);
        let request = self.build_request(question, schema, sample, parameterized, attempt);
        let completion = self.model.complete(&request, TASK_SQL_SYNTHESIS)?;

        match parse_query_completion(&completion.text) {
            Ok(text) => {
                debug!(
                    fingerprint = completion.fingerprint.short(),
                    cache_hit = completion.cache_hit,
                    query = %text,
                    "query synthesized"
                );
                Ok(SynthesizedQuery {
                    text,
                    bindings: bindings.clone(),
                    fingerprint: completion.fingerprint,
                    cache_hit: completion.cache_hit,
                })
            }
            Err(err) => {
                warn!(
                    fingerprint = completion.fingerprint.short(),
                    error = %err,
                    "unusable synthesis completion, evicting"
                );
                self.model.cache().delete(&completion.fingerprint);
                Err(err)
            }
        }
    }
}
