/// Data store construction errors (opening the database, resolving the table).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open data store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("table not found: {table}")]
    TableNotFound { table: String },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },
}
