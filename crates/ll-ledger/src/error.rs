//! Error types for the ledger database.

use thiserror::Error;

/// Ledger database errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open or create the ledger database (L001).
    #[error("[L001] Ledger database connection failed: {0}")]
    ConnectionError(String),

    /// Schema migration failed (L002).
    #[error("[L002] Ledger database migration failed: {0}")]
    MigrationError(String),

    /// SQL execution error inside the ledger database (L003).
    #[error("[L003] Ledger database query failed: {0}")]
    QueryError(String),

    /// Transaction management error (L004).
    #[error("[L004] Ledger database transaction failed: {0}")]
    TransactionError(String),

    /// More than one open lineage record for a dataset (L005).
    #[error("[L005] Ambiguous lineage for '{table_name}': open lineage keys {open_keys:?}; an earlier load was interrupted and must be resolved")]
    AmbiguousLineage {
        table_name: String,
        open_keys: Vec<i64>,
    },

    /// No open lineage record for a dataset (L006).
    #[error("[L006] No open lineage record for '{table_name}'")]
    NoOpenLineage { table_name: String },

    /// Lineage key does not exist (L007).
    #[error("[L007] Lineage record {lineage_key} not found")]
    LineageNotFound { lineage_key: i64 },

    /// Lineage record was already finalized as successful (L008).
    #[error("[L008] Lineage record {lineage_key} is already finalized")]
    AlreadyFinalized { lineage_key: i64 },

    /// Lineage record was already closed as failed (L009).
    #[error("[L009] Lineage record {lineage_key} was already marked as failed")]
    AlreadyFailed { lineage_key: i64 },

    /// A stored timestamp could not be parsed (L010).
    #[error("[L010] Invalid timestamp in ledger: {0}")]
    InvalidTimestamp(String),
}

/// Result type alias for [`LedgerError`].
pub type LedgerResult<T> = Result<T, LedgerError>;
