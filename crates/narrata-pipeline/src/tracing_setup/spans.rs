//! Span definitions per pipeline stage.

/// Create the span enclosing a whole run.
#[macro_export]
macro_rules! pipeline_span {
    ($run_id:expr, $question:expr) => {
        tracing::info_span!("narrata.pipeline", run_id = %$run_id, question = %$question)
    };
}

/// Create a query-synthesis span.
#[macro_export]
macro_rules! synthesis_span {
    ($attempt:expr) => {
        tracing::info_span!("narrata.synthesis", attempt = $attempt)
    };
}

/// Create a query-execution span.
#[macro_export]
macro_rules! execution_span {
    ($max_rows:expr) => {
        tracing::info_span!("narrata.execution", max_rows = $max_rows)
    };
}

/// Create a narration span.
#[macro_export]
macro_rules! narration_span {
    ($attempt:expr, $rows:expr, $truncated:expr) => {
        tracing::info_span!(
            "narrata.narration",
            attempt = $attempt,
            rows = $rows,
            truncated = $truncated
        )
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const PIPELINE: &str = "narrata.pipeline";
    pub const SYNTHESIS: &str = "narrata.synthesis";
    pub const EXECUTION: &str = "narrata.execution";
    pub const NARRATION: &str = "narrata.narration";
}
