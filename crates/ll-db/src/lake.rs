//! Append-only Parquet lake.
//!
//! Each append writes one new file,
//! `{dataset_root}/MonthID={month_id}/part-{lineage_key}-{uuid}.parquet`.
//! Existing files are never rewritten, so a partition is the union of every
//! load that touched its month.

use crate::duckdb::DuckDbSession;
use crate::error::{DbError, DbResult};
use crate::rows::{format_timestamp, parse_timestamp, LakeRow};
use crate::traits::LakeWriter;
use async_trait::async_trait;
use duckdb::Connection;
use ll_core::sql_utils::{quote_ident, quote_literal};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// One month partition of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LakePartition {
    pub dataset_root: PathBuf,
    pub month_id: String,
}

impl LakePartition {
    pub fn new(dataset_root: impl Into<PathBuf>, month_id: impl Into<String>) -> Self {
        Self {
            dataset_root: dataset_root.into(),
            month_id: month_id.into(),
        }
    }

    /// Partition directory name, `MonthID={month_id}`
    pub fn dir_name(&self) -> String {
        format!("MonthID={}", self.month_id)
    }

    pub fn path(&self) -> PathBuf {
        self.dataset_root.join(self.dir_name())
    }

    /// Part files currently in the partition, sorted by name.
    pub fn part_files(&self) -> DbResult<Vec<PathBuf>> {
        let dir = self.path();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(lake_io(&dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| lake_io(&dir, e))?.path();
            let is_part = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("part-") && n.ends_with(".parquet"));
            if is_part {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn glob(&self) -> String {
        self.path().join("part-*.parquet").display().to_string()
    }
}

/// Outcome of one append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LakeWriteReceipt {
    /// File written; `None` when there was nothing to write
    pub path: Option<PathBuf>,
    pub rows_written: u64,
}

/// Writes lake partitions as Parquet through a DuckDB session.
pub struct ParquetLakeWriter {
    session: Arc<DuckDbSession>,
}

impl ParquetLakeWriter {
    pub fn new(session: Arc<DuckDbSession>) -> Self {
        Self { session }
    }

    /// Read back every row stored under `partition`, ordered by lineage key then id.
    pub fn read_partition(&self, partition: &LakePartition) -> DbResult<Vec<LakeRow>> {
        if partition.part_files()?.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.session.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, CAST(create_date AS VARCHAR), amount, status,
                    local_date, month_id, lineage_key
             FROM read_parquet({})
             ORDER BY lineage_key, id",
            quote_literal(&partition.glob())
        ))?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(id, create_date, amount, status, local_date, month_id, lineage_key)| {
                    Ok(LakeRow {
                        id,
                        create_date: parse_timestamp(&create_date)?,
                        amount,
                        status,
                        local_date,
                        month_id,
                        lineage_key,
                    })
                },
            )
            .collect()
    }

    fn append_sync(&self, rows: &[LakeRow], partition: &LakePartition) -> DbResult<LakeWriteReceipt> {
        let Some(first) = rows.first() else {
            log::debug!("Nothing to append to {}", partition.dir_name());
            return Ok(LakeWriteReceipt {
                path: None,
                rows_written: 0,
            });
        };

        let lineage_key = first.lineage_key;
        if let Some(stray) = rows.iter().find(|r| r.lineage_key != lineage_key) {
            return Err(DbError::InvalidRow(format!(
                "row {} is tagged with lineage {} in a batch for lineage {lineage_key}",
                stray.id, stray.lineage_key
            )));
        }

        self.write_part(rows, partition, lineage_key, Uuid::new_v4())
    }

    /// Write `rows` as part file `part-{lineage_key}-{part_id}.parquet`.
    ///
    /// The file is copied out under a hidden staging name and then hard-linked
    /// into place, which fails instead of replacing an existing part file.
    pub(crate) fn write_part(
        &self,
        rows: &[LakeRow],
        partition: &LakePartition,
        lineage_key: i64,
        part_id: Uuid,
    ) -> DbResult<LakeWriteReceipt> {
        let dir = partition.path();
        std::fs::create_dir_all(&dir).map_err(|e| lake_io(&dir, e))?;
        let name = format!("part-{lineage_key}-{part_id}.parquet");
        let file = dir.join(&name);
        let staged_file = dir.join(format!(".{name}.tmp"));

        let staging = staging_table(part_id);
        let conn = self.session.lock()?;
        let result = write_staged(&conn, &staging, rows, &staged_file)
            .and_then(|()| publish(&staged_file, &file));
        let _ = conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(&staging)));
        let _ = std::fs::remove_file(&staged_file);
        result?;

        log::info!(
            "Appended {} rows to {} ({})",
            rows.len(),
            partition.dir_name(),
            file.display()
        );
        Ok(LakeWriteReceipt {
            path: Some(file),
            rows_written: rows.len() as u64,
        })
    }

    fn count_sync(&self, partition: &LakePartition) -> DbResult<u64> {
        if partition.part_files()?.is_empty() {
            return Ok(0);
        }
        let count: i64 = self.session.lock()?.query_row(
            &format!(
                "SELECT COUNT(*) FROM read_parquet({})",
                quote_literal(&partition.glob())
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl LakeWriter for ParquetLakeWriter {
    async fn append(
        &self,
        rows: &[LakeRow],
        partition: &LakePartition,
    ) -> DbResult<LakeWriteReceipt> {
        self.append_sync(rows, partition)
    }

    async fn partition_row_count(&self, partition: &LakePartition) -> DbResult<u64> {
        self.count_sync(partition)
    }
}

/// Stage `rows` in a temp table and copy it out to `file`.
fn write_staged(conn: &Connection, staging: &str, rows: &[LakeRow], file: &Path) -> DbResult<()> {
    let table = quote_ident(staging);
    conn.execute_batch(&format!(
        "CREATE TEMP TABLE {table} (
             id          BIGINT NOT NULL,
             create_date TIMESTAMP NOT NULL,
             amount      DOUBLE,
             status      VARCHAR,
             local_date  VARCHAR NOT NULL,
             month_id    VARCHAR NOT NULL,
             lineage_key BIGINT NOT NULL
         )"
    ))?;

    conn.execute_batch("BEGIN TRANSACTION")?;
    let inserted = insert_rows(conn, &table, rows);
    match inserted {
        Ok(()) => conn.execute_batch("COMMIT")?,
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }

    conn.execute_batch(&format!(
        "COPY (SELECT * FROM {table} ORDER BY id) TO {} (FORMAT PARQUET)",
        quote_literal(&file.display().to_string())
    ))?;
    Ok(())
}

fn insert_rows(conn: &Connection, table: &str, rows: &[LakeRow]) -> DbResult<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {table} VALUES (?, CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?)"
    ))?;
    for row in rows {
        stmt.execute(duckdb::params![
            row.id,
            format_timestamp(row.create_date),
            row.amount,
            row.status,
            row.local_date,
            row.month_id,
            row.lineage_key
        ])?;
    }
    Ok(())
}

fn staging_table(part_id: Uuid) -> String {
    format!("ll_stage_{}", part_id.simple())
}

/// Link the finished file into place under its final name.
fn publish(staged_file: &Path, file: &Path) -> DbResult<()> {
    std::fs::hard_link(staged_file, file).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => DbError::PartFileExists {
            path: file.display().to_string(),
        },
        _ => lake_io(file, e),
    })
}

fn lake_io(path: &Path, source: std::io::Error) -> DbError {
    DbError::LakeIo {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "lake_test.rs"]
mod tests;
