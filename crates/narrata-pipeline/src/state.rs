//! Per-run state machine: Synthesizing → Executing → Narrating → Done,
//! with Failed reachable from any non-terminal state.

use std::time::Instant;

use narrata_core::errors::{PipelineError, StageFailure};
use narrata_core::models::{PipelineStage, StageTiming};

#[derive(Debug, Clone)]
pub enum RunState {
    Active(PipelineStage),
    Failed(PipelineError),
}

/// Tracks the current stage of one run and the time spent in each stage.
#[derive(Debug)]
pub struct RunStateMachine {
    state: RunState,
    stage_started: Instant,
    timings: Vec<StageTiming>,
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self {
            state: RunState::Active(PipelineStage::Synthesizing),
            stage_started: Instant::now(),
            timings: Vec::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The active stage, or `None` once the run has failed.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self.state {
            RunState::Active(stage) => Some(stage),
            RunState::Failed(_) => None,
        }
    }

    /// Close the current stage and move to the next one.
    /// Returns the new stage, or `None` if the run was already terminal.
    pub fn advance(&mut self) -> Option<PipelineStage> {
        let RunState::Active(current) = self.state else {
            return None;
        };
        let next = current.next()?;
        self.close_stage(current);
        self.state = RunState::Active(next);
        Some(next)
    }

    /// Fail the run in its current stage. The returned error names that stage.
    pub fn fail(&mut self, cause: impl Into<StageFailure>) -> PipelineError {
        let stage = match &self.state {
            RunState::Active(stage) => *stage,
            RunState::Failed(existing) => return existing.clone(),
        };
        self.close_stage(stage);
        let error = PipelineError::new(stage, cause);
        self.state = RunState::Failed(error.clone());
        error
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, RunState::Active(PipelineStage::Done))
    }

    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    fn close_stage(&mut self, stage: PipelineStage) {
        if stage.is_terminal() {
            return;
        }
        self.timings.push(StageTiming {
            stage,
            elapsed_ms: self.stage_started.elapsed().as_millis() as u64,
        });
        self.stage_started = Instant::now();
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
