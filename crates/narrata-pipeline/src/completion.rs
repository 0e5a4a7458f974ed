//! Extraction of the query text from a synthesis completion.
//!
//! Models are asked for `{"query_string": "<SQL>"}` but do not always comply.
//! Accepted shapes, in order: the bare object, the object embedded in prose or
//! a code fence, a fenced ```sql block, and finally the raw text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use narrata_core::errors::SynthesisError;

static SQL_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:sql|sqlite)?\s*\n(.*?)```").ok());

#[derive(Deserialize)]
struct QueryEnvelope {
    query_string: String,
}

/// Pull the query out of `text`. Fails only when nothing usable remains.
pub fn parse_query_completion(text: &str) -> Result<String, SynthesisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(malformed("completion is empty"));
    }

    if let Some(query) = from_json(trimmed) {
        return non_empty(query);
    }
    if let Some(object) = braced_slice(trimmed) {
        if let Some(query) = from_json(object).or_else(|| from_json(&normalize_newlines(object))) {
            return non_empty(query);
        }
    }
    if let Some(query) = fenced_sql(trimmed) {
        return non_empty(query);
    }
    non_empty(trimmed.to_string())
}

fn from_json(text: &str) -> Option<String> {
    serde_json::from_str::<QueryEnvelope>(text)
        .ok()
        .map(|envelope| envelope.query_string)
}

/// The span from the first `{` to the last `}`.
fn braced_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Raw newlines inside JSON strings are invalid; models emit them anyway.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ")
}

fn fenced_sql(text: &str) -> Option<String> {
    let fence = SQL_FENCE.as_ref()?;
    fence
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn non_empty(query: String) -> Result<String, SynthesisError> {
    let query = query.trim().trim_end_matches(';').trim();
    if query.is_empty() {
        return Err(malformed("no query text in completion"));
    }
    Ok(query.to_string())
}

fn malformed(reason: &str) -> SynthesisError {
    SynthesisError::MalformedCompletion {
        reason: reason.to_string(),
    }
}
