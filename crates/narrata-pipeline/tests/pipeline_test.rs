//! End-to-end runs over the WDI fixture database with a scripted model.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use narrata_core::config::NarrataConfig;
use narrata_core::errors::{QueryExecutionErrorKind, SynthesisError, SynthesisErrorKind};
use narrata_core::models::{PipelineStage, QueryRequest, ScalarValue};
use narrata_core::traits::{IDataStore, IGenerativeModel, IResponseCache};
use narrata_llm::ResponseCache;
use narrata_pipeline::{CancellationToken, Pipeline, RunOutcome};
use narrata_store::SqliteDataStore;
use tempfile::TempDir;
use test_fixtures::{build_wdi_database, wdi_store_config, ScriptedModel, ScriptedTask, GDP_CODE};

const GDP_USA_2020: &str = "SELECT country, year, value FROM wdi \
     WHERE country_iso3 = 'USA' AND indicator_code = 'NY.GDP.MKTP.CD' AND year = 2020";

struct Harness {
    _dir: TempDir,
    pipeline: Pipeline,
    model: Arc<ScriptedModel>,
    cache: Arc<ResponseCache>,
    db_path: PathBuf,
}

fn harness(model: ScriptedModel, tweak: impl FnOnce(&mut NarrataConfig)) -> Harness {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("wdi.db");
    build_wdi_database(&db_path).unwrap();

    let mut config = NarrataConfig::default();
    config.store = wdi_store_config(&db_path);
    config.pipeline.reference_date = NaiveDate::from_ymd_opt(2024, 5, 1);
    tweak(&mut config);

    let store = Arc::new(SqliteDataStore::open(&config.store).unwrap());
    let model = Arc::new(model);
    let cache = Arc::new(ResponseCache::in_memory());
    let pipeline = Pipeline::new(
        store,
        model.clone() as Arc<dyn IGenerativeModel>,
        cache.clone() as Arc<dyn IResponseCache>,
        config,
    );
    Harness {
        _dir: dir,
        pipeline,
        model,
        cache,
        db_path,
    }
}

fn answering(sql: &str) -> Harness {
    harness(ScriptedModel::answering(sql), |_| {})
}

fn row_count(db_path: &Path) -> usize {
    let store = SqliteDataStore::open(&wdi_store_config(db_path)).unwrap();
    let result = store
        .execute("SELECT count(*) AS n FROM wdi", &Default::default(), &Default::default())
        .unwrap();
    match result.value(0, "n") {
        Some(ScalarValue::Integer(n)) => *n as usize,
        other => panic!("unexpected count {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HAPPY PATH
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn gdp_of_country_in_year() {
    let h = answering(GDP_USA_2020);
    let response = h.pipeline.answer("What was the GDP of the USA in 2020?").await.unwrap();

    assert!(response.query.text.contains("country_iso3 = 'USA'"));
    assert!(response.query.text.contains(GDP_CODE));
    assert!(response.query.text.contains("year = 2020"));
    assert_eq!(response.result.row_count(), 1);
    assert!(!response.result.truncated);
    assert_eq!(
        response.result.value(0, "value"),
        Some(&ScalarValue::Real(21354105000000.0))
    );
    assert!(response.text.contains("21354105000000"));

    let trace = &response.trace;
    assert!(!trace.run_id.is_empty());
    assert_eq!(trace.provider, "scripted");
    assert_eq!(trace.model, "gpt-4o-mini");
    assert_eq!(trace.attempts, 2);
    assert!(trace.started_at.is_some());
    assert!(trace.narration_fingerprint.is_some());
    let stages: Vec<_> = trace.timings.iter().map(|t| t.stage).collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::Synthesizing,
            PipelineStage::Executing,
            PipelineStage::Narrating
        ]
    );
    assert_eq!(h.model.calls(ScriptedTask::Synthesis), 1);
    assert_eq!(h.model.calls(ScriptedTask::Narration), 1);
}

#[tokio::test]
async fn synthesis_prompt_is_grounded_in_schema_and_samples() {
    let h = answering(GDP_USA_2020);
    h.pipeline.answer("GDP of USA in 2020?").await.unwrap();

    let synthesis = &h.model.requests()[0];
    let system = &synthesis.messages[0].content;
    assert!(system.starts_with("Current date: 2024-05-01"));
    assert!(system.contains("table: wdi"));
    assert!(system.contains("- country_iso3 (text): ISO 3166-1 alpha-3 country code"));
    assert!(!system.contains("indicator_name"));
    assert!(system.contains("Sample rows:"));
    assert!(system.contains("Do not use parameters"));
    assert_eq!(synthesis.messages[1].content, "GDP of USA in 2020?");
    assert_eq!(synthesis.model, "gpt-4o-mini");
}

#[tokio::test]
async fn no_sample_rows_when_disabled() {
    let h = harness(ScriptedModel::answering(GDP_USA_2020), |c| {
        c.pipeline.max_sample_rows = 0;
    });
    h.pipeline.answer("GDP of USA in 2020?").await.unwrap();
    assert!(!h.model.requests()[0].messages[0].content.contains("Sample rows:"));
}

#[tokio::test]
async fn empty_result_is_an_answer_not_an_error() {
    let h = answering("SELECT country, year, value FROM wdi WHERE indicator_code = 'XX.NOT.REAL'");
    let response = h.pipeline.answer("What is the XX indicator for Brazil?").await.unwrap();

    assert!(response.result.is_empty());
    assert!(response.text.contains("No data was found"));
    let prompt = h.model.last_narration_prompt().unwrap();
    assert!(prompt.contains("Rows returned: 0"));
    assert!(prompt.contains("The query returned no rows."));
}

#[tokio::test]
async fn all_null_columns_are_dropped() {
    let h = answering("SELECT country, footnote FROM wdi WHERE country_iso3 = 'BRA'");
    let response = h.pipeline.answer("Footnotes for Brazil?").await.unwrap();
    assert_eq!(response.result.columns, vec!["country".to_string()]);

    let h = harness(
        ScriptedModel::answering("SELECT country, footnote FROM wdi WHERE country_iso3 = 'BRA'"),
        |c| c.pipeline.drop_empty_columns = false,
    );
    let response = h.pipeline.answer("Footnotes for Brazil?").await.unwrap();
    assert_eq!(response.result.columns, vec!["country".to_string(), "footnote".to_string()]);
}

// ═══════════════════════════════════════════════════════════════════════════
// INDICATOR-SCOPED RUNS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn indicator_is_bound_and_named() {
    let h = answering(
        "SELECT country, year, value FROM wdi \
         WHERE country_iso3 = 'DEU' AND indicator_code = :indicator ORDER BY year",
    );
    let response = h
        .pipeline
        .answer_for_indicator("How did German GDP evolve?", GDP_CODE)
        .await
        .unwrap();

    assert_eq!(response.result.row_count(), 4);
    assert_eq!(response.result.value(0, "year"), Some(&ScalarValue::Integer(2018)));
    assert_eq!(
        response.query.bindings.get("indicator"),
        Some(&ScalarValue::from(GDP_CODE))
    );

    let synthesis = &h.model.requests()[0].messages[0].content;
    assert!(synthesis.contains(":indicator"));
    let narration = h.model.last_narration_prompt().unwrap();
    assert!(narration.contains("You know this data (GDP (current US$)):"));
}

// ═══════════════════════════════════════════════════════════════════════════
// ACCEPT-LIST
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn mutating_query_is_denied_before_narration() {
    let h = answering("DELETE FROM wdi");
    let err = h.pipeline.answer("Remove everything").await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Executing);
    assert_eq!(err.execution_kind(), Some(QueryExecutionErrorKind::PermissionDenied));
    assert_eq!(h.model.calls(ScriptedTask::Narration), 0);
    assert_eq!(row_count(&h.db_path), 24);
}

#[tokio::test]
async fn stacked_statement_is_denied() {
    let h = answering("SELECT 1; DROP TABLE wdi");
    let err = h.pipeline.answer("q").await.unwrap_err();
    assert_eq!(err.execution_kind(), Some(QueryExecutionErrorKind::PermissionDenied));
    assert_eq!(row_count(&h.db_path), 24);
}

#[tokio::test]
async fn invalid_query_fails_in_execution() {
    let h = answering("SELECT no_such_column FROM wdi");
    let err = h.pipeline.answer("q").await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Executing);
    assert_eq!(err.execution_kind(), Some(QueryExecutionErrorKind::SyntaxInvalid));
}

// ═══════════════════════════════════════════════════════════════════════════
// ROW CAP
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn narration_never_sees_more_rows_than_the_cap() {
    let h = harness(ScriptedModel::answering("SELECT * FROM wdi"), |c| {
        c.pipeline.max_result_rows = 5;
    });
    let response = h.pipeline.answer("Show everything").await.unwrap();

    assert_eq!(response.result.row_count(), 5);
    assert!(response.result.truncated);
    let prompt = h.model.last_narration_prompt().unwrap();
    assert!(prompt.contains("Rows returned: 5 (truncated: true)"));
    // header + separator + five rows
    let data = prompt.split_once("Data:\n").unwrap().1;
    assert_eq!(data.lines().filter(|l| l.starts_with('|')).count(), 7);
}

#[tokio::test]
async fn capped_result_keeps_the_latest_years() {
    // Ascending order puts the oldest rows first; the cap must still keep 2021.
    let h = harness(
        ScriptedModel::answering("SELECT country, year, value FROM wdi ORDER BY year, country"),
        |c| c.pipeline.max_result_rows = 5,
    );
    let response = h.pipeline.answer("Show everything").await.unwrap();

    assert_eq!(response.result.row_count(), 5);
    assert!(response.result.truncated);
    for row in &response.result.rows {
        assert_eq!(row.get("year"), Some(&ScalarValue::Integer(2021)));
    }
    // Ties on year break by country, descending, so Brazil loses one row.
    let countries: Vec<&str> = response
        .result
        .rows
        .iter()
        .filter_map(|r| r.get("country").and_then(ScalarValue::as_str))
        .collect();
    assert_eq!(countries.iter().filter(|c| **c == "Brazil").count(), 1);
    assert_eq!(countries.iter().filter(|c| **c == "United States").count(), 2);
}

#[tokio::test]
async fn result_under_the_cap_is_not_truncated() {
    let h = answering("SELECT * FROM wdi");
    let response = h.pipeline.answer("Show everything").await.unwrap();
    assert_eq!(response.result.row_count(), 24);
    assert!(!response.result.truncated);
    assert!(h
        .model
        .last_narration_prompt()
        .unwrap()
        .contains("(truncated: false)"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn warmed_cache_answers_without_calling_the_model() {
    let h = answering(GDP_USA_2020);
    let first = h.pipeline.answer("GDP of USA in 2020?").await.unwrap();
    assert!(!first.query.cache_hit);
    assert!(!first.trace.narration_cache_hit);

    let second = h.pipeline.answer("GDP of USA in 2020?").await.unwrap();
    assert_eq!(h.model.total_calls(), 2);
    assert!(second.query.cache_hit);
    assert!(second.trace.narration_cache_hit);

    assert_eq!(first.query.text, second.query.text);
    assert_eq!(first.query.fingerprint, second.query.fingerprint);
    assert_eq!(first.result, second.result);
    assert_eq!(first.text, second.text);
    assert_ne!(first.trace.run_id, second.trace.run_id);
}

#[tokio::test]
async fn different_questions_do_not_share_entries() {
    let h = answering(GDP_USA_2020);
    h.pipeline.answer("GDP of USA in 2020?").await.unwrap();
    h.pipeline.answer("What was US GDP in 2020?").await.unwrap();
    assert_eq!(h.model.calls(ScriptedTask::Synthesis), 2);
}

#[tokio::test]
async fn unusable_synthesis_completion_is_evicted() {
    let h = harness(
        ScriptedModel::new(|_, _| Ok(r#"{"query_string": ""}"#.to_string())),
        |_| {},
    );
    let err = h.pipeline.answer("q").await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Synthesizing);
    assert_eq!(err.synthesis_kind(), Some(SynthesisErrorKind::MalformedCompletion));

    let fingerprint = h.model.requests()[0].fingerprint();
    assert!(h.cache.get(&fingerprint).is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// FAILURES & TIMEOUTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn execution_timeout_names_the_executing_stage() {
    let h = harness(
        ScriptedModel::answering(
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT count(*) FROM c",
        ),
        |c| c.pipeline.execution_timeout_ms = 100,
    );
    let err = h.pipeline.answer("Count forever").await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Executing);
    assert!(err.is_timeout());
    assert_eq!(err.execution_kind(), Some(QueryExecutionErrorKind::Timeout));
    assert_eq!(h.model.calls(ScriptedTask::Narration), 0);
}

#[tokio::test]
async fn synthesis_timeout_surfaces_as_synthesis_error() {
    let h = harness(
        ScriptedModel::answering(GDP_USA_2020).with_delay(Duration::from_millis(300)),
        |c| c.pipeline.synthesis_timeout_ms = 50,
    );
    let err = h.pipeline.answer("q").await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Synthesizing);
    assert_eq!(err.synthesis_kind(), Some(SynthesisErrorKind::Timeout));
}

#[tokio::test]
async fn narration_failure_names_the_narrating_stage() {
    let h = harness(
        ScriptedModel::new(|task, _| match task {
            ScriptedTask::Synthesis => Ok(format!(r#"{{"query_string": "{GDP_USA_2020}"}}"#)),
            ScriptedTask::Narration => Err(SynthesisError::ModelUnavailable {
                provider: "scripted".into(),
                reason: "overloaded".into(),
            }),
        }),
        |_| {},
    );
    let err = h.pipeline.answer("q").await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Narrating);
    assert_eq!(err.synthesis_kind(), Some(SynthesisErrorKind::ModelUnavailable));
}

#[tokio::test]
async fn oversized_prompt_never_reaches_the_model() {
    let h = harness(ScriptedModel::answering(GDP_USA_2020), |c| {
        c.pipeline.max_prompt_chars = 100;
    });
    let err = h.pipeline.answer("q").await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Synthesizing);
    assert_eq!(err.synthesis_kind(), Some(SynthesisErrorKind::PromptTooLarge));
    assert_eq!(h.model.total_calls(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// RETRY
// ═══════════════════════════════════════════════════════════════════════════

fn flaky_once() -> ScriptedModel {
    let failed = std::sync::atomic::AtomicBool::new(false);
    ScriptedModel::new(move |task, _| match task {
        ScriptedTask::Synthesis if !failed.swap(true, std::sync::atomic::Ordering::SeqCst) => {
            Err(SynthesisError::ModelUnavailable {
                provider: "scripted".into(),
                reason: "flaky".into(),
            })
        }
        ScriptedTask::Synthesis => Ok(format!(r#"{{"query_string": "{GDP_USA_2020}"}}"#)),
        ScriptedTask::Narration => Ok("GDP was about 21.4 trillion US$.".to_string()),
    })
}

#[tokio::test]
async fn no_retry_by_default() {
    let h = harness(flaky_once(), |_| {});
    let err = h.pipeline.answer("q").await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Synthesizing);
    assert_eq!(h.model.calls(ScriptedTask::Synthesis), 1);
}

#[tokio::test]
async fn opt_in_retry_uses_a_fresh_fingerprint() {
    let h = harness(flaky_once(), |c| c.pipeline.max_attempts = 3);
    let response = h.pipeline.answer("q").await.unwrap();

    assert_eq!(h.model.calls(ScriptedTask::Synthesis), 2);
    assert_eq!(response.trace.attempts, 3);
    let requests = h.model.requests();
    assert_ne!(requests[0].fingerprint(), requests[1].fingerprint());
    assert_eq!(requests[0].messages, requests[1].messages);
}

// ═══════════════════════════════════════════════════════════════════════════
// CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn cancelled_before_start_calls_nothing() {
    let h = answering(GDP_USA_2020);
    let token = CancellationToken::new();
    token.cancel();
    let err = h
        .pipeline
        .answer_with(QueryRequest::new("q"), &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.stage, PipelineStage::Synthesizing);
    assert_eq!(h.model.total_calls(), 0);
}

#[tokio::test]
async fn cancellation_between_stages_keeps_completed_cache_writes() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let h = harness(
        ScriptedModel::new(move |_, _| {
            trigger.cancel();
            Ok(format!(r#"{{"query_string": "{GDP_USA_2020}"}}"#))
        }),
        |_| {},
    );
    let err = h
        .pipeline
        .answer_with(QueryRequest::new("q"), &token)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.stage, PipelineStage::Executing);
    assert_eq!(h.model.calls(ScriptedTask::Narration), 0);
    let fingerprint = h.model.requests()[0].fingerprint();
    assert!(h.cache.get(&fingerprint).is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN LOG
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn run_log_records_outcomes() {
    let h = answering(GDP_USA_2020);
    h.pipeline.answer("GDP of USA in 2020?").await.unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let _ = h
        .pipeline
        .answer_with(QueryRequest::new("q"), &token)
        .await;

    let runs = h.pipeline.recent_runs(10);
    assert_eq!(runs.len(), 2);
    assert!(matches!(
        runs[0].outcome,
        RunOutcome::Failed { stage: PipelineStage::Synthesizing, .. }
    ));
    assert_eq!(runs[1].outcome, RunOutcome::Answered);
    assert_eq!(runs[1].rows, 1);
    assert_eq!(h.pipeline.failure_count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// CONCURRENCY
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_do_not_serialize() {
    let h = harness(
        ScriptedModel::answering(GDP_USA_2020).with_delay(Duration::from_millis(100)),
        |_| {},
    );
    let pipeline = Arc::new(h.pipeline);

    let started = Instant::now();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.answer(&format!("GDP of USA in 2020? ({i})")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Eight runs of two 100 ms calls each would take 1.6 s back to back.
    assert!(started.elapsed() < Duration::from_millis(1_000));
    assert_eq!(h.model.total_calls(), 16);
}
