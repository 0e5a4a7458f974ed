//! Subscriber initialization and stage spans.

pub mod spans;

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use narrata_core::config::ObservabilityConfig;

/// Environment variable whose filter directives override the configured level.
pub const LOG_ENV_VAR: &str = "NARRATA_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber. Safe to call more than once; only the
/// first call has an effect, and an already-installed subscriber is kept.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| {
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
        });

        let installed = if config.json_logs {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_target(true).with_current_span(true))
                .with(filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
        };

        if installed.is_err() {
            tracing::debug!("global subscriber already installed, keeping it");
        }
    });
}

/// Whether [`init_tracing`] has run.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
