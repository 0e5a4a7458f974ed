use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::completion::Fingerprint;

/// A memoized completion. Content-addressed by `fingerprint`; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Model that produced the text.
    pub model: String,
    /// Pipeline task that issued the request, e.g. "sql_synthesis".
    pub task_label: String,
}

impl CacheEntry {
    pub fn new(
        fingerprint: Fingerprint,
        text: impl Into<String>,
        model: impl Into<String>,
        task_label: impl Into<String>,
    ) -> Self {
        Self {
            fingerprint,
            text: text.into(),
            created_at: Utc::now(),
            model: model.into(),
            task_label: task_label.into(),
        }
    }
}
