//! rusqlite error classification.

use std::time::Duration;

use rusqlite::ErrorCode;

use narrata_core::errors::{QueryExecutionError, StoreError};

/// Classify a rusqlite failure raised while preparing or stepping a query.
pub fn to_query_err(err: &rusqlite::Error, elapsed: Duration) -> QueryExecutionError {
    if let rusqlite::Error::MultipleStatement = err {
        return QueryExecutionError::PermissionDenied {
            reason: "multiple statements are not accepted".to_string(),
        };
    }
    match err.sqlite_error_code() {
        Some(ErrorCode::OperationInterrupted) => QueryExecutionError::Timeout {
            elapsed_ms: elapsed.as_millis() as u64,
        },
        Some(
            ErrorCode::ReadOnly
            | ErrorCode::PermissionDenied
            | ErrorCode::AuthorizationForStatementDenied,
        ) => QueryExecutionError::PermissionDenied {
            reason: err.to_string(),
        },
        Some(
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::SystemIoFailure
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked,
        ) => QueryExecutionError::ConnectionLost {
            reason: err.to_string(),
        },
        _ => QueryExecutionError::SyntaxInvalid {
            reason: err.to_string(),
        },
    }
}

pub fn to_store_err(msg: impl std::fmt::Display) -> StoreError {
    StoreError::Sqlite {
        message: msg.to_string(),
    }
}
