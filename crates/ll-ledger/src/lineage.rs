//! Lineage log: one record per load attempt.
//!
//! A record is opened before any data moves and finalized only after the lake
//! write is durable. A record left open is the trace of an interrupted load;
//! it is reported, never reused or overwritten.

use crate::error::{LedgerError, LedgerResult};
use crate::row_helpers::{format_ts, parse_opt_ts, parse_ts};
use chrono::{Duration, Local, NaiveDateTime};
use duckdb::Connection;
use serde::Serialize;
use std::fmt;

const SELECT_LINEAGE: &str = "SELECT lineage_key, table_name,
        CAST(data_load_started AS VARCHAR),
        CAST(data_load_completed AS VARCHAR),
        was_successful,
        CAST(source_system_cutoff_time AS VARCHAR),
        row_no
    FROM ll_ledger.log_lineage";

const OPEN_PREDICATE: &str = "was_successful = false AND data_load_completed IS NULL";

/// One row of `ll_ledger.log_lineage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageRecord {
    pub lineage_key: i64,
    pub table_name: String,
    pub data_load_started: NaiveDateTime,
    pub data_load_completed: Option<NaiveDateTime>,
    pub was_successful: bool,
    pub source_system_cutoff_time: Option<NaiveDateTime>,
    pub row_no: Option<i64>,
}

/// Derived state of a lineage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageStatus {
    /// Load in flight, or interrupted before finalization
    Open,
    /// Load finalized after a durable lake write
    Succeeded,
    /// Closed by an operator after an interrupted load
    Failed,
}

impl fmt::Display for LineageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineageStatus::Open => write!(f, "open"),
            LineageStatus::Succeeded => write!(f, "succeeded"),
            LineageStatus::Failed => write!(f, "failed"),
        }
    }
}

impl LineageRecord {
    pub fn status(&self) -> LineageStatus {
        match (self.was_successful, self.data_load_completed) {
            (true, _) => LineageStatus::Succeeded,
            (false, None) => LineageStatus::Open,
            (false, Some(_)) => LineageStatus::Failed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == LineageStatus::Open
    }

    /// Time elapsed since the load started.
    pub fn age(&self, now: NaiveDateTime) -> Duration {
        now.signed_duration_since(self.data_load_started)
    }
}

/// Raw column values before timestamp parsing.
type RawLineageRow = (
    i64,
    String,
    String,
    Option<String>,
    bool,
    Option<String>,
    Option<i64>,
);

fn read_raw(row: &duckdb::Row<'_>) -> duckdb::Result<RawLineageRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_record(raw: RawLineageRow) -> LedgerResult<LineageRecord> {
    let (lineage_key, table_name, started, completed, was_successful, cutoff, row_no) = raw;
    Ok(LineageRecord {
        lineage_key,
        table_name,
        data_load_started: parse_ts(&started)?,
        data_load_completed: parse_opt_ts(completed)?,
        was_successful,
        source_system_cutoff_time: parse_opt_ts(cutoff)?,
        row_no,
    })
}

/// Lineage operations over a borrowed ledger connection.
///
/// Borrowing the connection lets the same operations run inside a
/// [`crate::LedgerDb::transaction`] body.
pub struct LineageLedger<'a> {
    conn: &'a Connection,
}

impl<'a> LineageLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Open a lineage record for a load starting now.
    ///
    /// Returns the key assigned by the ledger's sequence. The record is
    /// committed before this returns.
    pub fn open(&self, table_name: &str) -> LedgerResult<i64> {
        self.open_at(table_name, Local::now().naive_local())
    }

    /// Open a lineage record with an explicit start time.
    pub fn open_at(&self, table_name: &str, started_at: NaiveDateTime) -> LedgerResult<i64> {
        let lineage_key: i64 = self
            .conn
            .query_row("SELECT nextval('ll_ledger.seq_lineage_key')", [], |row| {
                row.get(0)
            })
            .map_err(|e| LedgerError::QueryError(format!("allocate lineage key: {e}")))?;

        self.conn
            .execute(
                "INSERT INTO ll_ledger.log_lineage (lineage_key, table_name, data_load_started)
                 VALUES (?, ?, CAST(? AS TIMESTAMP))",
                duckdb::params![lineage_key, table_name, format_ts(started_at)],
            )
            .map_err(|e| LedgerError::QueryError(format!("insert log_lineage: {e}")))?;

        log::debug!("Opened lineage record {lineage_key} for '{table_name}'");
        Ok(lineage_key)
    }

    /// Return the key of the single open record for `table_name`.
    ///
    /// Fails with [`LedgerError::AmbiguousLineage`] when more than one record
    /// is open; the caller must not pick one.
    pub fn current_open_key(&self, table_name: &str) -> LedgerResult<i64> {
        let open_keys = self.open_keys(table_name)?;
        match open_keys.as_slice() {
            [] => Err(LedgerError::NoOpenLineage {
                table_name: table_name.to_string(),
            }),
            [key] => Ok(*key),
            _ => Err(LedgerError::AmbiguousLineage {
                table_name: table_name.to_string(),
                open_keys,
            }),
        }
    }

    /// Mark an open record as successfully loaded.
    ///
    /// A record can be finalized exactly once; later calls are errors.
    pub fn finalize(
        &self,
        lineage_key: i64,
        completed_at: NaiveDateTime,
        source_cutoff_time: NaiveDateTime,
        row_count: i64,
    ) -> LedgerResult<()> {
        let updated = self
            .conn
            .execute(
                &format!(
                    "UPDATE ll_ledger.log_lineage
                     SET was_successful = true,
                         data_load_completed = CAST(? AS TIMESTAMP),
                         source_system_cutoff_time = CAST(? AS TIMESTAMP),
                         row_no = ?
                     WHERE lineage_key = ? AND {OPEN_PREDICATE}"
                ),
                duckdb::params![
                    format_ts(completed_at),
                    format_ts(source_cutoff_time),
                    row_count,
                    lineage_key
                ],
            )
            .map_err(|e| LedgerError::QueryError(format!("finalize log_lineage: {e}")))?;

        if updated == 0 {
            return Err(self.closed_record_error(lineage_key)?);
        }

        log::debug!("Finalized lineage record {lineage_key} with {row_count} rows");
        Ok(())
    }

    /// Close an open record as failed.
    ///
    /// This is the operator's recovery action after an interrupted load.
    pub fn mark_failed(&self, lineage_key: i64, at: NaiveDateTime) -> LedgerResult<()> {
        let updated = self
            .conn
            .execute(
                &format!(
                    "UPDATE ll_ledger.log_lineage
                     SET data_load_completed = CAST(? AS TIMESTAMP)
                     WHERE lineage_key = ? AND {OPEN_PREDICATE}"
                ),
                duckdb::params![format_ts(at), lineage_key],
            )
            .map_err(|e| LedgerError::QueryError(format!("mark log_lineage failed: {e}")))?;

        if updated == 0 {
            return Err(self.closed_record_error(lineage_key)?);
        }

        log::warn!("Lineage record {lineage_key} marked as failed");
        Ok(())
    }

    /// Fetch a single record.
    pub fn get(&self, lineage_key: i64) -> LedgerResult<Option<LineageRecord>> {
        let raw = self.conn.query_row(
            &format!("{SELECT_LINEAGE} WHERE lineage_key = ?"),
            duckdb::params![lineage_key],
            read_raw,
        );
        match raw {
            Ok(raw) => into_record(raw).map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LedgerError::QueryError(format!("select log_lineage: {e}"))),
        }
    }

    /// All open records for `table_name`, oldest first.
    pub fn list_open(&self, table_name: &str) -> LedgerResult<Vec<LineageRecord>> {
        self.query_records(
            &format!(
                "{SELECT_LINEAGE} WHERE table_name = ? AND {OPEN_PREDICATE} ORDER BY lineage_key"
            ),
            table_name,
        )
    }

    /// Open records that started more than `max_age` before `now`.
    pub fn stale_open(
        &self,
        table_name: &str,
        now: NaiveDateTime,
        max_age: Duration,
    ) -> LedgerResult<Vec<LineageRecord>> {
        Ok(self
            .list_open(table_name)?
            .into_iter()
            .filter(|r| r.age(now) > max_age)
            .collect())
    }

    /// The most recent successful load for `table_name`.
    pub fn last_successful(&self, table_name: &str) -> LedgerResult<Option<LineageRecord>> {
        let mut records = self.query_records(
            &format!(
                "{SELECT_LINEAGE} WHERE table_name = ? AND was_successful = true
                 ORDER BY lineage_key DESC LIMIT 1"
            ),
            table_name,
        )?;
        Ok(records.pop())
    }

    /// The `limit` most recent records for `table_name`, newest first.
    pub fn recent(&self, table_name: &str, limit: usize) -> LedgerResult<Vec<LineageRecord>> {
        let mut records = self.query_records(
            &format!("{SELECT_LINEAGE} WHERE table_name = ? ORDER BY lineage_key DESC"),
            table_name,
        )?;
        records.truncate(limit);
        Ok(records)
    }

    fn open_keys(&self, table_name: &str) -> LedgerResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT lineage_key FROM ll_ledger.log_lineage
                 WHERE table_name = ? AND {OPEN_PREDICATE}
                 ORDER BY lineage_key"
            ))
            .map_err(|e| LedgerError::QueryError(format!("prepare open lineage keys: {e}")))?;

        let keys = stmt
            .query_map(duckdb::params![table_name], |row| row.get::<_, i64>(0))
            .map_err(|e| LedgerError::QueryError(format!("query open lineage keys: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::QueryError(format!("collect open lineage keys: {e}")))?;
        Ok(keys)
    }

    fn query_records(&self, sql: &str, table_name: &str) -> LedgerResult<Vec<LineageRecord>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| LedgerError::QueryError(format!("prepare log_lineage: {e}")))?;

        let raw_rows = stmt
            .query_map(duckdb::params![table_name], read_raw)
            .map_err(|e| LedgerError::QueryError(format!("query log_lineage: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::QueryError(format!("collect log_lineage: {e}")))?;

        raw_rows.into_iter().map(into_record).collect()
    }

    /// Explain why an update matched no open record.
    fn closed_record_error(&self, lineage_key: i64) -> LedgerResult<LedgerError> {
        Ok(match self.get(lineage_key)? {
            None => LedgerError::LineageNotFound { lineage_key },
            Some(record) if record.was_successful => LedgerError::AlreadyFinalized { lineage_key },
            Some(_) => LedgerError::AlreadyFailed { lineage_key },
        })
    }
}

#[cfg(test)]
#[path = "lineage_test.rs"]
mod tests;
