//! Error types for ll-db

use thiserror::Error;

/// Data plane errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Source database could not be attached (D004)
    #[error("[D004] Failed to attach source database '{path}': {message}")]
    AttachError { path: String, message: String },

    /// Filesystem error under the lake root (D005)
    #[error("[D005] Lake I/O error at {path}: {source}")]
    LakeIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Part file already exists; the lake is never overwritten (D006)
    #[error("[D006] Lake part file already exists: {path}")]
    PartFileExists { path: String },

    /// Mutex poisoned (D007)
    #[error("[D007] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// A row could not be decoded or does not belong in the batch (D008)
    #[error("[D008] Invalid row: {0}")]
    InvalidRow(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error carries no structured catalog variants; match the message narrowly.
        let msg = err.to_string();
        let missing = msg.contains("does not exist") || msg.contains("not found");
        if missing
            && (msg.contains("Table with name")
                || msg.contains("Table or view with name")
                || (msg.contains("Catalog Error") && msg.contains("Table")))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
