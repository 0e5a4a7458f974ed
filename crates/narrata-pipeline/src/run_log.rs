//! Bounded in-process log of pipeline runs: outcome, failing stage, latency,
//! cache hits, truncation.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use narrata_core::errors::{PipelineError, StageFailure};
use narrata_core::models::{NarrativeResponse, PipelineStage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Answered,
    Failed { stage: PipelineStage, cause: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub run_id: String,
    pub question: String,
    pub outcome: RunOutcome,
    pub latency: Duration,
    pub synthesis_cache_hit: bool,
    pub narration_cache_hit: bool,
    pub rows: usize,
    pub truncated: bool,
    pub timestamp_epoch_ms: i64,
}

impl RunLogEntry {
    pub fn answered(question: &str, response: &NarrativeResponse, latency: Duration) -> Self {
        Self {
            run_id: response.trace.run_id.clone(),
            question: question.to_string(),
            outcome: RunOutcome::Answered,
            latency,
            synthesis_cache_hit: response.query.cache_hit,
            narration_cache_hit: response.trace.narration_cache_hit,
            rows: response.result.row_count(),
            truncated: response.result.truncated,
            timestamp_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn failed(run_id: &str, question: &str, error: &PipelineError, latency: Duration) -> Self {
        let cause = match &error.cause {
            StageFailure::Synthesis(e) => format!("{:?}", e.kind()),
            StageFailure::Execution(e) => format!("{:?}", e.kind()),
            StageFailure::Cancelled => "Cancelled".to_string(),
        };
        Self {
            run_id: run_id.to_string(),
            question: question.to_string(),
            outcome: RunOutcome::Failed {
                stage: error.stage,
                cause,
            },
            latency,
            synthesis_cache_hit: false,
            narration_cache_hit: false,
            rows: 0,
            truncated: false,
            timestamp_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, RunOutcome::Failed { .. })
    }
}

/// Ring buffer of the most recent runs.
#[derive(Debug, Clone)]
pub struct RunLog {
    entries: VecDeque<RunLogEntry>,
    capacity: usize,
}

impl RunLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, entry: RunLogEntry) {
        tracing::debug!(
            event = "run_logged",
            run_id = %entry.run_id,
            outcome = ?entry.outcome,
            latency_ms = entry.latency.as_millis() as u64,
            rows = entry.rows,
            truncated = entry.truncated,
            "run logged"
        );
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Up to `n` entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<RunLogEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failure()).count()
    }

    /// Failed runs per stage.
    pub fn failures_in(&self, stage: PipelineStage) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.outcome, RunOutcome::Failed { stage: s, .. } if *s == stage))
            .count()
    }

    pub fn avg_latency(&self) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.entries.iter().map(|e| e.latency).sum();
        total / self.entries.len() as u32
    }

    /// Latency at percentile `p` in 0.0..=1.0.
    pub fn latency_percentile(&self, p: f64) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let mut latencies: Vec<Duration> = self.entries.iter().map(|e| e.latency).collect();
        latencies.sort();
        let idx = ((p.clamp(0.0, 1.0) * (latencies.len() - 1) as f64).round() as usize)
            .min(latencies.len() - 1);
        latencies[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrata_core::errors::QueryExecutionError;

    fn failed(stage: PipelineStage, ms: u64) -> RunLogEntry {
        let err = PipelineError::new(stage, QueryExecutionError::Timeout { elapsed_ms: ms });
        RunLogEntry::failed("r", "q", &err, Duration::from_millis(ms))
    }

    #[test]
    fn keeps_only_the_newest_entries() {
        let mut log = RunLog::with_capacity(2);
        for ms in [10, 20, 30] {
            log.record(failed(PipelineStage::Executing, ms));
        }
        assert_eq!(log.count(), 2);
        let recent = log.recent(5);
        assert_eq!(recent[0].latency, Duration::from_millis(30));
        assert_eq!(recent[1].latency, Duration::from_millis(20));
    }

    #[test]
    fn summaries() {
        let mut log = RunLog::with_capacity(10);
        assert_eq!(log.avg_latency(), Duration::ZERO);
        log.record(failed(PipelineStage::Executing, 10));
        log.record(failed(PipelineStage::Synthesizing, 30));
        assert_eq!(log.failure_count(), 2);
        assert_eq!(log.failures_in(PipelineStage::Executing), 1);
        assert_eq!(log.avg_latency(), Duration::from_millis(20));
        assert_eq!(log.latency_percentile(1.0), Duration::from_millis(30));
        assert_eq!(log.latency_percentile(0.0), Duration::from_millis(10));
    }

    #[test]
    fn failure_records_cause_kind() {
        let entry = failed(PipelineStage::Executing, 5);
        assert_eq!(
            entry.outcome,
            RunOutcome::Failed {
                stage: PipelineStage::Executing,
                cause: "Timeout".into()
            }
        );
    }
}
