//! Query-synthesis prompt: schema, optional sample rows, rules, output format.

use chrono::NaiveDate;

use narrata_core::constants::{INDICATOR_PARAM, MAX_SAMPLE_ROWS_HARD_CAP};
use narrata_core::models::{ChatMessage, QueryResult, SchemaDescriptor};

use super::render::render_table;

/// Everything the synthesis prompt is built from, besides the question.
pub struct SynthesisPrompt<'a> {
    pub schema: &'a SchemaDescriptor,
    pub dataset_description: &'a str,
    pub sample: Option<&'a QueryResult>,
    pub current_date: NaiveDate,
    /// The indicator is bound at execution time as `:indicator`.
    pub parameterized_indicator: bool,
}

impl SynthesisPrompt<'_> {
    pub fn build_messages(&self, question: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system_text()), ChatMessage::user(question)]
    }

    fn system_text(&self) -> String {
        let mut text = format!(
            "Current date: {}\n\n\
             I have a database containing data from {}. \
             Write one SQLite query that answers the user's question.\n\n\
             table: {}\ncolumns:\n",
            self.current_date,
            self.dataset_description,
            self.schema.table()
        );
        for column in self.schema.columns() {
            text.push_str(&format!("- {} ({})", column.name, column.semantic_type.as_str()));
            if let Some(description) = &column.description {
                text.push_str(&format!(": {description}"));
            }
            text.push('\n');
        }

        if let Some(sample) = self.sample.filter(|s| !s.is_empty()) {
            let mut bounded = sample.clone();
            bounded.truncate_to(MAX_SAMPLE_ROWS_HARD_CAP);
            text.push_str("\nSample rows:\n");
            text.push_str(&render_table(&bounded));
            text.push('\n');
        }

        text.push_str("\nRules:\n");
        text.push_str("- Use only the table and columns listed above.\n");
        text.push_str("- Write a single read-only SELECT statement. Never modify data.\n");
        if self.parameterized_indicator {
            text.push_str(&format!(
                "- Only the indicator may be parameterized: use the named parameter :{INDICATOR_PARAM} \
                 and never `?`. Fill in every other value yourself.\n"
            ));
        } else {
            text.push_str("- Do not use parameters. Write every value literally.\n");
        }
        if self.schema.has_column("country_iso3") && self.schema.has_column("country") {
            text.push_str("- Filter countries with country_iso3 and return country in the result.\n");
        }
        if self.schema.has_column("year") {
            text.push_str(
                "- Use the last 10 years if no year is specified, and include the year in the \
                 SELECT clause when it helps the analysis.\n",
            );
        }
        text.push_str("- Exclude rows with no value.\n");
        text.push_str("\nReturn the output as JSON: {\"query_string\": \"<SQL>\"}");
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrata_core::models::{ColumnDef, SemanticType};

    fn schema() -> SchemaDescriptor {
        let col = |name: &str, ty| ColumnDef {
            name: name.into(),
            semantic_type: ty,
            description: None,
        };
        SchemaDescriptor::new(
            "wdi",
            vec![
                col("country", SemanticType::Text),
                col("country_iso3", SemanticType::Text),
                col("year", SemanticType::Integer),
                col("value", SemanticType::Real),
            ],
        )
    }

    fn prompt(schema: &SchemaDescriptor, parameterized: bool) -> SynthesisPrompt<'_> {
        SynthesisPrompt {
            schema,
            dataset_description: "the World Development Indicators (WDI)",
            sample: None,
            current_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            parameterized_indicator: parameterized,
        }
    }

    #[test]
    fn starts_with_current_date_and_lists_columns() {
        let schema = schema();
        let messages = prompt(&schema, false).build_messages("GDP of USA in 2020?");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.starts_with("Current date: 2024-05-01"));
        assert!(messages[0].content.contains("- country_iso3 (text)"));
        assert!(messages[0].content.contains("query_string"));
        assert!(messages[0].content.contains("Do not use parameters"));
        assert_eq!(messages[1].content, "GDP of USA in 2020?");
    }

    #[test]
    fn indicator_rule_when_parameterized() {
        let schema = schema();
        let messages = prompt(&schema, true).build_messages("q");
        assert!(messages[0].content.contains(":indicator"));
    }

    #[test]
    fn identical_inputs_give_identical_messages() {
        let schema = schema();
        assert_eq!(
            prompt(&schema, false).build_messages("q"),
            prompt(&schema, false).build_messages("q")
        );
    }
}
