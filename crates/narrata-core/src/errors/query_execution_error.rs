/// Failures of the data store adapter, including accept-list rejections.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryExecutionError {
    #[error("query syntax invalid: {reason}")]
    SyntaxInvalid { reason: String },

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("query timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("connection lost: {reason}")]
    ConnectionLost { reason: String },
}

/// Field-less discriminant of [`QueryExecutionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryExecutionErrorKind {
    SyntaxInvalid,
    PermissionDenied,
    Timeout,
    ConnectionLost,
}

impl QueryExecutionError {
    pub fn kind(&self) -> QueryExecutionErrorKind {
        match self {
            Self::SyntaxInvalid { .. } => QueryExecutionErrorKind::SyntaxInvalid,
            Self::PermissionDenied { .. } => QueryExecutionErrorKind::PermissionDenied,
            Self::Timeout { .. } => QueryExecutionErrorKind::Timeout,
            Self::ConnectionLost { .. } => QueryExecutionErrorKind::ConnectionLost,
        }
    }
}
