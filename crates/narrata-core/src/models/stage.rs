use std::fmt;

use serde::{Deserialize, Serialize};

/// Stages of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Synthesizing,
    Executing,
    Narrating,
    Done,
}

impl PipelineStage {
    /// The stage that follows this one, or `None` for `Done`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Synthesizing => Some(Self::Executing),
            Self::Executing => Some(Self::Narrating),
            Self::Narrating => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synthesizing => "synthesizing",
            Self::Executing => "executing",
            Self::Narrating => "narrating",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
