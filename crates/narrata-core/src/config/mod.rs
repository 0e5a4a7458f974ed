pub mod cache_config;
pub mod defaults;
pub mod model_config;
pub mod observability_config;
pub mod pipeline_config;
pub mod store_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cache_config::CacheConfig;
pub use model_config::ModelConfig;
pub use observability_config::ObservabilityConfig;
pub use pipeline_config::PipelineConfig;
pub use store_config::StoreConfig;

use crate::constants::{MAX_RESULT_ROWS_HARD_CAP, MAX_SAMPLE_ROWS_HARD_CAP};
use crate::errors::ConfigError;

/// Providers understood by the model factory.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "ollama"];

/// Top-level configuration, passed explicitly into the pipeline at construction.
///
/// Every section falls back to its defaults, so an empty TOML document is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrataConfig {
    pub model: ModelConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub observability: ObservabilityConfig,
}

impl NarrataConfig {
    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&self.model.provider.as_str()) {
            return Err(invalid(
                "model.provider",
                format!("unknown provider '{}'", self.model.provider),
            ));
        }
        if self.model.model.trim().is_empty() {
            return Err(invalid("model.model", "model identifier is empty"));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(invalid(
                "model.temperature",
                format!("{} is outside 0.0..=2.0", self.model.temperature),
            ));
        }
        if self.store.table.trim().is_empty() {
            return Err(invalid("store.table", "table name is empty"));
        }
        if self.pipeline.max_sample_rows > MAX_SAMPLE_ROWS_HARD_CAP {
            return Err(invalid(
                "pipeline.max_sample_rows",
                format!(
                    "{} exceeds the hard cap of {MAX_SAMPLE_ROWS_HARD_CAP}",
                    self.pipeline.max_sample_rows
                ),
            ));
        }
        if self.pipeline.max_result_rows == 0
            || self.pipeline.max_result_rows > MAX_RESULT_ROWS_HARD_CAP
        {
            return Err(invalid(
                "pipeline.max_result_rows",
                format!(
                    "{} is outside 1..={MAX_RESULT_ROWS_HARD_CAP}",
                    self.pipeline.max_result_rows
                ),
            ));
        }
        for (field, value) in [
            ("pipeline.synthesis_timeout_ms", self.pipeline.synthesis_timeout_ms),
            ("pipeline.execution_timeout_ms", self.pipeline.execution_timeout_ms),
            ("pipeline.narration_timeout_ms", self.pipeline.narration_timeout_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "timeout must be positive"));
            }
        }
        if self.pipeline.max_attempts == 0 {
            return Err(invalid("pipeline.max_attempts", "at least one attempt is required"));
        }
        if self.pipeline.max_prompt_chars == 0 {
            return Err(invalid("pipeline.max_prompt_chars", "prompt budget must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}
