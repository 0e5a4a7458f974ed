use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::completion::Fingerprint;
use super::value::ScalarValue;

/// A single user call into the pipeline. Not persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRequest {
    pub question: String,
    /// Named parameters bound at execution time, e.g. `indicator`.
    pub bindings: BTreeMap<String, ScalarValue>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            bindings: BTreeMap::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }
}

/// Query text produced by the synthesizer.
///
/// The text is untrusted model output: it must pass the store's read-only
/// accept-list before it runs. Semantic correctness is not modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedQuery {
    pub text: String,
    /// Named parameters to bind when executing `text`.
    pub bindings: BTreeMap<String, ScalarValue>,
    /// Fingerprint of the completion the query came from.
    pub fingerprint: Fingerprint,
    pub cache_hit: bool,
}
