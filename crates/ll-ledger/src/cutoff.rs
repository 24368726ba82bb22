//! Cutoff watermark: how far each dataset is known to be loaded.

use crate::error::{LedgerError, LedgerResult};
use crate::row_helpers::{format_ts, parse_ts};
use chrono::NaiveDateTime;
use duckdb::Connection;
use serde::Serialize;

/// One row of `ll_ledger.log_cutoff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutoffRecord {
    pub table_name: String,
    /// Upper time bound already durably loaded
    pub cutoff_time: NaiveDateTime,
    /// Max source id already durably loaded; `None` until a non-empty load
    pub cutoff_id: Option<i64>,
}

/// Cutoff operations over a borrowed ledger connection.
pub struct CutoffLedger<'a> {
    conn: &'a Connection,
}

impl<'a> CutoffLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Current watermark for `table_name`, if any load has completed.
    pub fn get(&self, table_name: &str) -> LedgerResult<Option<CutoffRecord>> {
        let row = self.conn.query_row(
            "SELECT table_name, CAST(cutoff_time AS VARCHAR), cutoff_id
             FROM ll_ledger.log_cutoff WHERE table_name = ?",
            duckdb::params![table_name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            },
        );

        match row {
            Ok((table_name, cutoff_time, cutoff_id)) => Ok(Some(CutoffRecord {
                table_name,
                cutoff_time: parse_ts(&cutoff_time)?,
                cutoff_id,
            })),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LedgerError::QueryError(format!("select log_cutoff: {e}"))),
        }
    }

    /// Move the watermark for `table_name` forward.
    ///
    /// Each field becomes the max of its stored and proposed value, so the
    /// watermark never moves backwards. `cutoff_id = None` keeps the stored
    /// id. Returns the record as written.
    pub fn advance(
        &self,
        table_name: &str,
        cutoff_time: NaiveDateTime,
        cutoff_id: Option<i64>,
    ) -> LedgerResult<CutoffRecord> {
        let Some(previous) = self.get(table_name)? else {
            let record = CutoffRecord {
                table_name: table_name.to_string(),
                cutoff_time,
                cutoff_id,
            };
            self.conn
                .execute(
                    "INSERT INTO ll_ledger.log_cutoff (table_name, cutoff_time, cutoff_id)
                     VALUES (?, CAST(? AS TIMESTAMP), ?)",
                    duckdb::params![table_name, format_ts(cutoff_time), cutoff_id],
                )
                .map_err(|e| LedgerError::QueryError(format!("insert log_cutoff: {e}")))?;
            log::debug!("Created cutoff for '{table_name}' at {cutoff_time} / {cutoff_id:?}");
            return Ok(record);
        };

        if cutoff_time < previous.cutoff_time {
            log::warn!(
                "Ignoring cutoff_time regression for '{table_name}': {} -> {}",
                previous.cutoff_time,
                cutoff_time
            );
        }
        if let (Some(old), Some(new)) = (previous.cutoff_id, cutoff_id) {
            if new < old {
                log::warn!("Ignoring cutoff_id regression for '{table_name}': {old} -> {new}");
            }
        }

        let record = CutoffRecord {
            table_name: table_name.to_string(),
            cutoff_time: previous.cutoff_time.max(cutoff_time),
            cutoff_id: previous.cutoff_id.max(cutoff_id),
        };

        self.conn
            .execute(
                "UPDATE ll_ledger.log_cutoff
                 SET cutoff_time = CAST(? AS TIMESTAMP), cutoff_id = ?
                 WHERE table_name = ?",
                duckdb::params![format_ts(record.cutoff_time), record.cutoff_id, table_name],
            )
            .map_err(|e| LedgerError::QueryError(format!("update log_cutoff: {e}")))?;

        log::debug!(
            "Advanced cutoff for '{table_name}' to {} / {:?}",
            record.cutoff_time,
            record.cutoff_id
        );
        Ok(record)
    }
}

#[cfg(test)]
#[path = "cutoff_test.rs"]
mod tests;
