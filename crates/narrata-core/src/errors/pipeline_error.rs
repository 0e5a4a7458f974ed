use crate::errors::query_execution_error::{QueryExecutionError, QueryExecutionErrorKind};
use crate::errors::synthesis_error::{SynthesisError, SynthesisErrorKind};
use crate::models::PipelineStage;

/// Why a stage did not complete.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StageFailure {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Execution(#[from] QueryExecutionError),

    #[error("run cancelled")]
    Cancelled,
}

/// Terminal failure of a pipeline run: the stage that failed and its cause.
///
/// The originating stage is never masked, so a caller can always tell a
/// synthesis failure from an execution failure from a narration failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("pipeline failed while {stage}: {cause}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub cause: StageFailure,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, cause: impl Into<StageFailure>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }

    pub fn cancelled(stage: PipelineStage) -> Self {
        Self {
            stage,
            cause: StageFailure::Cancelled,
        }
    }

    /// Whether the stage failed by exceeding its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.cause,
            StageFailure::Synthesis(SynthesisError::Timeout { .. })
                | StageFailure::Execution(QueryExecutionError::Timeout { .. })
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, StageFailure::Cancelled)
    }

    pub fn execution_kind(&self) -> Option<QueryExecutionErrorKind> {
        match &self.cause {
            StageFailure::Execution(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn synthesis_kind(&self) -> Option<SynthesisErrorKind> {
        match &self.cause {
            StageFailure::Synthesis(e) => Some(e.kind()),
            _ => None,
        }
    }
}
