pub mod cache_error;
pub mod config_error;
pub mod pipeline_error;
pub mod query_execution_error;
pub mod store_error;
pub mod synthesis_error;

pub use cache_error::CacheError;
pub use config_error::ConfigError;
pub use pipeline_error::{PipelineError, StageFailure};
pub use query_execution_error::{QueryExecutionError, QueryExecutionErrorKind};
pub use store_error::StoreError;
pub use synthesis_error::{SynthesisError, SynthesisErrorKind};

/// Umbrella error for construction and wiring. Pipeline runs report
/// [`PipelineError`] directly.
#[derive(Debug, thiserror::Error)]
pub enum NarrataError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("query execution error: {0}")]
    QueryExecution(#[from] QueryExecutionError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type NarrataResult<T> = Result<T, NarrataError>;
