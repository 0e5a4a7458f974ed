//! The pipeline orchestrator: sequences synthesis, execution and narration for one question.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn, Instrument, Span};
use uuid::Uuid;

use narrata_core::config::{NarrataConfig, PipelineConfig};
use narrata_core::constants::INDICATOR_PARAM;
use narrata_core::errors::{
    NarrataResult, PipelineError, QueryExecutionError, StageFailure, SynthesisError,
};
use narrata_core::models::{
    NarrativeResponse, QueryRequest, QueryResult, RunTrace, SchemaDescriptor, SynthesizedQuery,
};
use narrata_core::traits::{IDataStore, IGenerativeModel, IResponseCache};
use narrata_llm::{create_provider, CachedModel, ResponseCache};
use narrata_store::SqliteDataStore;

use crate::cancel::CancellationToken;
use crate::executor::QueryExecutor;
use crate::narrator::NarrativeGenerator;
use crate::retry::RetryPolicy;
use crate::run_log::{RunLog, RunLogEntry};
use crate::state::RunStateMachine;
use crate::synthesizer::QuerySynthesizer;
use crate::tracing_setup;

/// Answers natural-language questions over one table.
///
/// Runs are independent: a `Pipeline` may serve any number of concurrent
/// [`answer`](Self::answer) calls, which share only the store connections
/// and the response cache. Within a run the stages are strictly sequential,
/// and a run either returns a complete [`NarrativeResponse`] or a
/// [`PipelineError`] naming the stage that failed.
pub struct Pipeline {
    store: Arc<dyn IDataStore>,
    synthesizer: Arc<QuerySynthesizer>,
    executor: Arc<QueryExecutor>,
    narrator: Arc<NarrativeGenerator>,
    retry: RetryPolicy,
    config: PipelineConfig,
    provider: String,
    model_id: String,
    run_log: Mutex<RunLog>,
}

impl Pipeline {
    /// Build the SQLite store, the configured provider and the response cache.
    pub fn from_config(config: NarrataConfig) -> NarrataResult<Self> {
        config.validate()?;
        tracing_setup::init_tracing(&config.observability);

        let store: Arc<dyn IDataStore> = Arc::new(SqliteDataStore::open(&config.store)?);
        let model: Arc<dyn IGenerativeModel> = Arc::from(create_provider(&config.model)?);
        let cache = ResponseCache::from_config(&config.cache)?;
        info!(
            provider = model.name(),
            model = %config.model.model,
            persistent_cache = cache.is_persistent(),
            "pipeline components ready"
        );
        Ok(Self::new(store, model, Arc::new(cache), config))
    }

    /// Assemble a pipeline from explicit components.
    pub fn new(
        store: Arc<dyn IDataStore>,
        model: Arc<dyn IGenerativeModel>,
        cache: Arc<dyn IResponseCache>,
        config: NarrataConfig,
    ) -> Self {
        let pipeline = config.pipeline;
        let cached = CachedModel::new(model, cache).with_prompt_budget(pipeline.max_prompt_chars);
        let max_rows = pipeline.effective_result_rows();
        let provider = cached.provider_name().to_string();

        let synthesizer = QuerySynthesizer::new(
            cached.clone(),
            config.model.clone(),
            config.store.dataset_description.clone(),
            pipeline.reference_date,
        );
        let executor = QueryExecutor::new(
            Arc::clone(&store),
            max_rows,
            pipeline.execution_timeout(),
            pipeline.drop_empty_columns,
        );
        let narrator = NarrativeGenerator::new(
            cached,
            config.model.clone(),
            max_rows,
            config.store.indicator_names.clone(),
        );

        Self {
            store,
            synthesizer: Arc::new(synthesizer),
            executor: Arc::new(executor),
            narrator: Arc::new(narrator),
            retry: RetryPolicy::new(pipeline.max_attempts),
            provider,
            model_id: config.model.model,
            run_log: Mutex::new(RunLog::with_capacity(config.observability.run_log_capacity)),
            config: pipeline,
        }
    }

    pub async fn answer(&self, question: &str) -> Result<NarrativeResponse, PipelineError> {
        self.answer_with(QueryRequest::new(question), &CancellationToken::new())
            .await
    }

    /// Answer a question scoped to one indicator, bound as `:indicator`.
    pub async fn answer_for_indicator(
        &self,
        question: &str,
        indicator_code: &str,
    ) -> Result<NarrativeResponse, PipelineError> {
        let request = QueryRequest::new(question).bind(INDICATOR_PARAM, indicator_code);
        self.answer_with(request, &CancellationToken::new()).await
    }

    /// Answer `request`, checking `cancel` between stages.
    pub async fn answer_with(
        &self,
        request: QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<NarrativeResponse, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let span = crate::pipeline_span!(run_id, request.question);

        let outcome = self.run(&run_id, &request, cancel).instrument(span).await;

        let latency = started.elapsed();
        let entry = match &outcome {
            Ok(response) => {
                info!(
                    run_id = %run_id,
                    rows = response.result.row_count(),
                    truncated = response.result.truncated,
                    elapsed_ms = latency.as_millis() as u64,
                    "run answered"
                );
                RunLogEntry::answered(&request.question, response, latency)
            }
            Err(err) => {
                warn!(
                    run_id = %run_id,
                    stage = %err.stage,
                    error = %err.cause,
                    elapsed_ms = latency.as_millis() as u64,
                    "run failed"
                );
                RunLogEntry::failed(&run_id, &request.question, err, latency)
            }
        };
        match self.run_log.lock() {
            Ok(mut log) => log.record(entry),
            Err(_) => warn!("run log lock poisoned, run not recorded"),
        }
        outcome
    }

    /// Up to `n` recent runs, newest first.
    pub fn recent_runs(&self, n: usize) -> Vec<RunLogEntry> {
        self.run_log.lock().map(|log| log.recent(n)).unwrap_or_default()
    }

    pub fn failure_count(&self) -> usize {
        self.run_log.lock().map(|log| log.failure_count()).unwrap_or(0)
    }

    pub fn avg_latency(&self) -> Duration {
        self.run_log
            .lock()
            .map(|log| log.avg_latency())
            .unwrap_or(Duration::ZERO)
    }

    pub fn schema(&self) -> Arc<SchemaDescriptor> {
        self.store.describe_schema()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn run(
        &self,
        run_id: &str,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<NarrativeResponse, PipelineError> {
        let started_at = Utc::now();
        let mut machine = RunStateMachine::new();

        let schema = self.store.describe_schema();
        let sample = self.fetch_sample().await;
        if cancel.is_cancelled() {
            return Err(machine.fail(StageFailure::Cancelled));
        }

        let synthesizer = Arc::clone(&self.synthesizer);
        let question = request.question.clone();
        let bindings = request.bindings.clone();
        let (query, synthesis_attempts) = self
            .run_generative(
                self.config.synthesis_timeout(),
                cancel,
                |attempt| crate::synthesis_span!(attempt),
                move |attempt| {
                    synthesizer.synthesize(&question, &schema, sample.as_ref(), &bindings, attempt)
                },
            )
            .await
            .map_err(|cause| machine.fail(cause))?;
        machine.advance();
        if cancel.is_cancelled() {
            return Err(machine.fail(StageFailure::Cancelled));
        }

        let result = self
            .execute(&query)
            .await
            .map_err(|cause| machine.fail(cause))?;
        machine.advance();
        if cancel.is_cancelled() {
            return Err(machine.fail(StageFailure::Cancelled));
        }

        let narrator = Arc::clone(&self.narrator);
        let question = request.question.clone();
        let rows = result.row_count();
        let truncated = result.truncated;
        let (response, narration_attempts) = self
            .run_generative(
                self.config.narration_timeout(),
                cancel,
                move |attempt| crate::narration_span!(attempt, rows, truncated),
                move |attempt| narrator.narrate(&question, &query, &result, attempt),
            )
            .await
            .map_err(|cause| machine.fail(cause))?;
        machine.advance();

        Ok(NarrativeResponse {
            trace: RunTrace {
                run_id: run_id.to_string(),
                provider: self.provider.clone(),
                model: self.model_id.clone(),
                started_at: Some(started_at),
                timings: machine.timings().to_vec(),
                attempts: synthesis_attempts + narration_attempts,
                ..response.trace
            },
            ..response
        })
    }

    /// Sample rows for grounding. A failure here only costs the few-shot rows.
    async fn fetch_sample(&self) -> Option<QueryResult> {
        let limit = self.config.effective_sample_rows();
        if limit == 0 {
            return None;
        }
        let timeout = self.config.execution_timeout();
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || store.sample_rows(limit, Some(timeout)));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(rows))) => Some(rows),
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "sample rows unavailable, synthesizing without them");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "sample row task failed, synthesizing without them");
                None
            }
            Err(_) => {
                warn!("sample rows timed out, synthesizing without them");
                None
            }
        }
    }

    async fn execute(&self, query: &SynthesizedQuery) -> Result<QueryResult, QueryExecutionError> {
        let timeout = self.config.execution_timeout();
        let executor = Arc::clone(&self.executor);
        let query = query.clone();
        let span = crate::execution_span!(executor.max_rows());
        let task = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            executor.run(&query)
        });
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Err(QueryExecutionError::ConnectionLost {
                reason: format!("execution task failed: {e}"),
            }),
            Err(_) => Err(QueryExecutionError::Timeout {
                elapsed_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Run a generative call on the blocking pool under one stage deadline,
    /// retrying per the retry policy. Returns the value and the attempts used.
    async fn run_generative<T, S, F>(
        &self,
        stage_timeout: Duration,
        cancel: &CancellationToken,
        span_for: S,
        call: F,
    ) -> Result<(T, u32), StageFailure>
    where
        T: Send + 'static,
        S: Fn(u32) -> Span,
        F: Fn(u32) -> Result<T, SynthesisError> + Send + Sync + 'static,
    {
        let call = Arc::new(call);
        let started = tokio::time::Instant::now();
        let deadline = started + stage_timeout;
        let mut attempt = 0u32;
        loop {
            if attempt > 0 && cancel.is_cancelled() {
                return Err(StageFailure::Cancelled);
            }
            let call = Arc::clone(&call);
            let span = span_for(attempt);
            let task = tokio::task::spawn_blocking(move || {
                let _entered = span.enter();
                call(attempt)
            });
            let error = match tokio::time::timeout_at(deadline, task).await {
                Ok(Ok(Ok(value))) => return Ok((value, attempt + 1)),
                Ok(Ok(Err(e))) => e,
                Ok(Err(e)) => SynthesisError::ModelUnavailable {
                    provider: "pipeline".to_string(),
                    reason: format!("generative task failed: {e}"),
                },
                Err(_) => {
                    return Err(SynthesisError::Timeout {
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    }
                    .into())
                }
            };
            if !self.retry.should_retry(attempt, &error) {
                return Err(error.into());
            }
            warn!(attempt, error = %error, "generative attempt failed, retrying");
            attempt += 1;
        }
    }
}
