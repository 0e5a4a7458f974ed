use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::completion::Fingerprint;
use super::query::SynthesizedQuery;
use super::result::QueryResult;
use super::stage::PipelineStage;

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed_ms: u64,
}

/// Provenance of a run, kept with the answer for auditing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunTrace {
    pub run_id: String,
    /// Provider that served the model, e.g. `openai` or `ollama`.
    pub provider: String,
    pub model: String,
    pub started_at: Option<DateTime<Utc>>,
    pub narration_fingerprint: Option<Fingerprint>,
    pub narration_cache_hit: bool,
    pub timings: Vec<StageTiming>,
    /// Generative attempts used, synthesis plus narration.
    pub attempts: u32,
}

impl RunTrace {
    pub fn total_ms(&self) -> u64 {
        self.timings.iter().map(|t| t.elapsed_ms).sum()
    }
}

/// Final answer of a run: the narrative and the exact query and rows it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    pub text: String,
    pub query: SynthesizedQuery,
    /// Snapshot of the rows the narration saw.
    pub result: QueryResult,
    pub trace: RunTrace,
}
