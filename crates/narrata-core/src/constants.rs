/// narrata version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hard upper bound on sample rows embedded in the synthesis prompt.
/// Configuration may lower it, never raise it.
pub const MAX_SAMPLE_ROWS_HARD_CAP: usize = 20;

/// Hard upper bound on result rows handed to narration.
pub const MAX_RESULT_ROWS_HARD_CAP: usize = 500;

/// Named parameter bound to the indicator code in indicator-scoped runs.
pub const INDICATOR_PARAM: &str = "indicator";

/// Task label recorded on cache entries produced by query synthesis.
pub const TASK_SQL_SYNTHESIS: &str = "sql_synthesis";

/// Task label recorded on cache entries produced by narration.
pub const TASK_NARRATION: &str = "narration";

/// Column ranked first when a row cap forces rows to be dropped.
pub const YEAR_COLUMN: &str = "year";

/// Tie-break column for [`YEAR_COLUMN`] ranking.
pub const COUNTRY_COLUMN: &str = "country";

/// Rows fetched from the store before most-recent-first ranking applies the
/// configured cap. Results larger than this are ranked within the scanned prefix.
pub const MAX_RANKED_SCAN_ROWS: usize = 10_000;
