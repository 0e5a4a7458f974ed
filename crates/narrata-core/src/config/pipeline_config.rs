use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::{MAX_RESULT_ROWS_HARD_CAP, MAX_SAMPLE_ROWS_HARD_CAP};

/// Orchestration limits: grounding sizes, per-stage timeouts, retry opt-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rows embedded in the synthesis prompt (0 disables few-shot rows).
    pub max_sample_rows: usize,
    /// Result rows handed to narration. Larger results are truncated.
    pub max_result_rows: usize,
    pub synthesis_timeout_ms: u64,
    pub execution_timeout_ms: u64,
    pub narration_timeout_ms: u64,
    /// Upper bound on the total characters of an outbound prompt.
    pub max_prompt_chars: usize,
    /// Attempts per generative stage. 1 disables retry.
    pub max_attempts: u32,
    /// Remove columns that are null in every returned row.
    pub drop_empty_columns: bool,
    /// Fixed "current date" for prompts. Today (UTC) when absent.
    pub reference_date: Option<NaiveDate>,
}

impl PipelineConfig {
    /// Sample rows actually used, clamped to the hard cap.
    pub fn effective_sample_rows(&self) -> usize {
        self.max_sample_rows.min(MAX_SAMPLE_ROWS_HARD_CAP)
    }

    /// Result rows actually passed on, clamped to the hard cap.
    pub fn effective_result_rows(&self) -> usize {
        self.max_result_rows.clamp(1, MAX_RESULT_ROWS_HARD_CAP)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis_timeout_ms)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    pub fn narration_timeout(&self) -> Duration {
        Duration::from_millis(self.narration_timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_sample_rows: defaults::DEFAULT_MAX_SAMPLE_ROWS,
            max_result_rows: defaults::DEFAULT_MAX_RESULT_ROWS,
            synthesis_timeout_ms: defaults::DEFAULT_SYNTHESIS_TIMEOUT_MS,
            execution_timeout_ms: defaults::DEFAULT_EXECUTION_TIMEOUT_MS,
            narration_timeout_ms: defaults::DEFAULT_NARRATION_TIMEOUT_MS,
            max_prompt_chars: defaults::DEFAULT_MAX_PROMPT_CHARS,
            max_attempts: defaults::DEFAULT_MAX_ATTEMPTS,
            drop_empty_columns: defaults::DEFAULT_DROP_EMPTY_COLUMNS,
            reference_date: None,
        }
    }
}
