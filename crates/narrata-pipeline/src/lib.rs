//! # narrata-pipeline
//!
//! Answers natural-language questions over a statistical table in three
//! stages: synthesize a read-only query with a generative model, execute it
//! against the store, and narrate the returned rows. Both generative calls go
//! through the response cache.

pub mod cancel;
pub mod completion;
pub mod executor;
pub mod narrator;
pub mod orchestrator;
pub mod prompts;
pub mod retry;
pub mod run_log;
pub mod state;
pub mod synthesizer;
pub mod tracing_setup;

pub use cancel::CancellationToken;
pub use orchestrator::Pipeline;
pub use retry::RetryPolicy;
pub use run_log::{RunLog, RunLogEntry, RunOutcome};
pub use tracing_setup::init_tracing;
