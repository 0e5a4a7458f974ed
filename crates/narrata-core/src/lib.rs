//! # narrata-core
//!
//! Foundation crate for the narrata pipeline.
//! Defines the data model, the component traits, the error taxonomy,
//! configuration, and constants. Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::NarrataConfig;
pub use errors::{
    NarrataError, NarrataResult, PipelineError, QueryExecutionError, StageFailure, SynthesisError,
};
pub use models::{
    Fingerprint, NarrativeResponse, PipelineStage, QueryResult, ScalarValue, SchemaDescriptor,
    SynthesizedQuery,
};
