//! Narration prompt: economist persona, the query that ran, the rows it returned.

use narrata_core::models::{ChatMessage, QueryResult};

use super::render::render_table;

pub struct NarrationPrompt<'a> {
    pub query: &'a str,
    pub result: &'a QueryResult,
    /// Human-readable indicator name for indicator-scoped runs.
    pub indicator_name: Option<&'a str>,
}

impl NarrationPrompt<'_> {
    pub fn build_messages(&self, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_text()),
            ChatMessage::user(format!(
                "You always answer the question based on the data you know, and show the \
                 relevant numbers but not the raw data. If the data is empty or does not answer \
                 the question, say that no data was found instead of guessing. You may respond \
                 in a different language if asked in the question. You approximate in millions \
                 or billions, and use correct units: ```{question}```"
            )),
        ]
    }

    fn system_text(&self) -> String {
        let known = match self.indicator_name {
            Some(name) => format!("You know this data ({name}):"),
            None => "You know this data:".to_string(),
        };
        let mut text = format!(
            "Pretend you are a genius economist. You respond in a narrative manner.\n\
             Select only the relevant data when responding to the prompt.\n\n\
             {known}\n\n\
             Query run:\n```sql\n{}\n```\n\n\
             Rows returned: {} (truncated: {})\n",
            self.query.trim(),
            self.result.row_count(),
            self.result.truncated
        );
        if self.result.truncated {
            text.push_str("Only the first rows are shown. Do not present them as the complete result.\n");
        }
        if self.result.is_empty() {
            text.push_str("The query returned no rows.\n");
        }
        text.push_str("\nData:\n");
        text.push_str(&render_table(self.result));
        text
    }
}
