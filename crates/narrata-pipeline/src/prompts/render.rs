//! Markdown rendering of result rows for prompts.

use narrata_core::models::QueryResult;

/// Placeholder rendered for a result with no rows.
pub const NO_ROWS: &str = "(no rows)";

/// Render rows as a markdown table, columns in result order.
pub fn render_table(result: &QueryResult) -> String {
    if result.rows.is_empty() || result.columns.is_empty() {
        return NO_ROWS.to_string();
    }
    let mut out = String::new();
    out.push('|');
    for column in &result.columns {
        out.push_str(&format!(" {} |", escape_cell(column)));
    }
    out.push_str("\n|");
    for _ in &result.columns {
        out.push_str(" --- |");
    }
    for row in &result.rows {
        out.push_str("\n|");
        for column in &result.columns {
            let cell = row.get(column).map(|v| v.to_string()).unwrap_or_default();
            out.push_str(&format!(" {} |", escape_cell(&cell)));
        }
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrata_core::models::{Row, ScalarValue};

    #[test]
    fn renders_header_separator_and_rows() {
        let mut row = Row::new();
        row.insert("year".into(), ScalarValue::Integer(2020));
        row.insert("value".into(), ScalarValue::Real(21354105000000.0));
        let result = QueryResult {
            columns: vec!["year".into(), "value".into()],
            rows: vec![row],
            truncated: false,
        };
        assert_eq!(
            render_table(&result),
            "| year | value |\n| --- | --- |\n| 2020 | 21354105000000 |"
        );
    }

    #[test]
    fn empty_result_renders_placeholder() {
        assert_eq!(render_table(&QueryResult::default()), NO_ROWS);
    }

    #[test]
    fn pipes_are_escaped() {
        let mut row = Row::new();
        row.insert("note".into(), ScalarValue::from("a|b"));
        let result = QueryResult {
            columns: vec!["note".into()],
            rows: vec![row],
            truncated: false,
        };
        assert!(render_table(&result).contains("a\\|b"));
    }
}
