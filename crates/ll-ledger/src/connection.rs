//! Ledger database connection wrapper.
//!
//! [`LedgerDb`] owns a DuckDB [`Connection`] and provides helpers for opening,
//! migrating, and transacting against the ledger database.

use crate::cutoff::{CutoffLedger, CutoffRecord};
use crate::error::{LedgerError, LedgerResult};
use crate::lineage::LineageLedger;
use crate::migration::run_migrations;
use crate::status::DatasetStatus;
use chrono::NaiveDateTime;
use duckdb::Connection;
use std::path::Path;

/// Bookkeeping written when a load completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCompletion<'a> {
    pub table_name: &'a str,
    pub lineage_key: i64,
    pub completed_at: NaiveDateTime,
    pub source_cutoff_time: NaiveDateTime,
    pub row_count: i64,
    /// Highest source id written; `None` for an empty load
    pub max_id: Option<i64>,
}

/// Wrapper around a DuckDB connection to the ledger database.
///
/// Not shared across tasks; a run touches the ledger from one task only.
pub struct LedgerDb {
    conn: Connection,
}

impl LedgerDb {
    /// Open (or create) the ledger database at `path` and run pending migrations.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| LedgerError::ConnectionError(format!("{e}: {}", path.display())))?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Create an in-memory ledger database with all migrations applied.
    ///
    /// Useful for unit tests that don't need persistence.
    pub fn open_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::ConnectionError(e.to_string()))?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open from a path string (handles the `:memory:` special case).
    pub fn new(path: &str) -> LedgerResult<Self> {
        if path == ":memory:" {
            Self::open_memory()
        } else {
            Self::open(Path::new(path))
        }
    }

    /// Lineage operations in auto-commit mode.
    pub fn lineage(&self) -> LineageLedger<'_> {
        LineageLedger::new(&self.conn)
    }

    /// Cutoff operations in auto-commit mode.
    pub fn cutoff(&self) -> CutoffLedger<'_> {
        CutoffLedger::new(&self.conn)
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    pub fn transaction<F, T>(&self, body: F) -> LedgerResult<T>
    where
        F: FnOnce(&Connection) -> LedgerResult<T>,
    {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| LedgerError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&self.conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(LedgerError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        result
    }

    /// Finalize the lineage record and advance the cutoff as one unit.
    ///
    /// Either both the lineage record is marked successful and the cutoff is
    /// advanced, or neither is.
    pub fn complete_load(&self, completion: &LoadCompletion<'_>) -> LedgerResult<CutoffRecord> {
        self.transaction(|conn| {
            LineageLedger::new(conn).finalize(
                completion.lineage_key,
                completion.completed_at,
                completion.source_cutoff_time,
                completion.row_count,
            )?;
            CutoffLedger::new(conn).advance(
                completion.table_name,
                completion.source_cutoff_time,
                completion.max_id,
            )
        })
    }

    /// Snapshot of a dataset's bookkeeping for operators.
    pub fn dataset_status(&self, table_name: &str) -> LedgerResult<DatasetStatus> {
        let lineage = self.lineage();
        Ok(DatasetStatus {
            table_name: table_name.to_string(),
            cutoff: self.cutoff().get(table_name)?,
            last_success: lineage.last_successful(table_name)?,
            open: lineage.list_open(table_name)?,
        })
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
