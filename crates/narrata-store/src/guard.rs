//! Read-only accept-list for untrusted query text.
//!
//! A statement is accepted only when it parses as a single `SELECT`-shaped
//! query (plain select, set operation, `VALUES`, CTEs whose bodies are
//! themselves selects). Text the parser cannot handle is classified by its
//! leading keyword: mutating keywords are denied, read-shaped text is deferred
//! to SQLite, where `Statement::readonly` and `query_only` still apply.

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::debug;

use narrata_core::errors::QueryExecutionError;

/// Leading keywords of statements that change the database or its connection.
const MUTATING_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "REPLACE", "UPSERT", "MERGE", "DROP", "CREATE", "ALTER",
    "TRUNCATE", "ATTACH", "DETACH", "PRAGMA", "VACUUM", "REINDEX", "ANALYZE", "BEGIN", "COMMIT",
    "END", "ROLLBACK", "SAVEPOINT", "RELEASE", "GRANT", "REVOKE", "COPY", "LOAD",
];

/// Leading keywords of read-shaped statements.
const READ_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES"];

/// Check `sql` against the accept-list.
pub fn check(sql: &str) -> Result<(), QueryExecutionError> {
    if sql.trim().trim_end_matches(';').trim().is_empty() {
        return Err(QueryExecutionError::SyntaxInvalid {
            reason: "empty query".to_string(),
        });
    }

    match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(statements) => check_statements(&statements),
        Err(parse_err) => {
            let syntax = || QueryExecutionError::SyntaxInvalid {
                reason: parse_err.to_string(),
            };
            let keywords = leading_keywords(sql).ok_or_else(syntax)?;
            if keywords.len() > 1 {
                return Err(denied(format!(
                    "expected one statement, got {}",
                    keywords.len()
                )));
            }
            let keyword = keywords.into_iter().next().ok_or_else(syntax)?;
            if MUTATING_KEYWORDS.contains(&keyword.as_str()) {
                return Err(denied(format!("{keyword} statements are not accepted")));
            }
            if READ_KEYWORDS.contains(&keyword.as_str()) {
                debug!(error = %parse_err, "accept-list parser gap, deferring to SQLite");
                return Ok(());
            }
            Err(syntax())
        }
    }
}

fn check_statements(statements: &[Statement]) -> Result<(), QueryExecutionError> {
    match statements {
        [] => Err(QueryExecutionError::SyntaxInvalid {
            reason: "empty query".to_string(),
        }),
        [Statement::Query(query)] => check_query(query),
        [_] => Err(denied("only SELECT queries are accepted")),
        _ => Err(denied(format!(
            "expected one statement, got {}",
            statements.len()
        ))),
    }
}

fn check_query(query: &Query) -> Result<(), QueryExecutionError> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            check_query(&cte.query)?;
        }
    }
    check_set_expr(&query.body)
}

fn check_set_expr(expr: &SetExpr) -> Result<(), QueryExecutionError> {
    match expr {
        SetExpr::Select(_) | SetExpr::Values(_) | SetExpr::Table(_) => Ok(()),
        SetExpr::Query(inner) => check_query(inner),
        SetExpr::SetOperation { left, right, .. } => {
            check_set_expr(left)?;
            check_set_expr(right)
        }
        _ => Err(denied("query body is not read-only")),
    }
}

/// Leading word of every `;`-separated statement in `sql`, upper-cased.
/// Segments without any word (stray semicolons) are ignored.
fn leading_keywords(sql: &str) -> Option<Vec<String>> {
    let tokens = Tokenizer::new(&SQLiteDialect {}, sql).tokenize().ok()?;
    let mut keywords = Vec::new();
    let mut expecting = true;
    for token in tokens {
        match token {
            Token::SemiColon => expecting = true,
            Token::Word(word) if expecting => {
                keywords.push(word.value.to_ascii_uppercase());
                expecting = false;
            }
            Token::Whitespace(_) | Token::LParen => {}
            _ => expecting = false,
        }
    }
    Some(keywords)
}

fn denied(reason: impl Into<String>) -> QueryExecutionError {
    QueryExecutionError::PermissionDenied {
        reason: reason.into(),
    }
}
