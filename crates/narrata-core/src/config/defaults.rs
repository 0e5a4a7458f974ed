// Single source of truth for all default values.

// --- Model ---
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// --- Store ---
pub const DEFAULT_DB_FILENAME: &str = "wdi.db";
pub const DEFAULT_TABLE: &str = "wdi";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_DATASET_DESCRIPTION: &str = "the World Development Indicators (WDI)";

// --- Cache ---
pub const DEFAULT_L1_CAPACITY: u64 = 10_000;

// --- Pipeline ---
pub const DEFAULT_MAX_SAMPLE_ROWS: usize = 3;
pub const DEFAULT_MAX_RESULT_ROWS: usize = 50;
pub const DEFAULT_SYNTHESIS_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_EXECUTION_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_NARRATION_TIMEOUT_MS: u64 = 90_000;
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 32_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;
pub const DEFAULT_DROP_EMPTY_COLUMNS: bool = true;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
pub const DEFAULT_RUN_LOG_CAPACITY: usize = 1_000;
