//! DuckDB compute session and source reader

use crate::error::{DbError, DbResult};
use crate::rows::{parse_timestamp, RowSet, SourceRow};
use crate::traits::SourceReader;
use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::Connection;
use ll_core::config::{SessionConfig, SourceColumns, SourceConfig};
use ll_core::sql_utils::{quote_ident, quote_literal, quote_qualified};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Catalog name a source database file is attached under.
pub const SOURCE_CATALOG: &str = "source";

/// Scoped DuckDB compute session.
///
/// Created once per run and shared by the reader and the writer through an
/// `Arc`; the connection closes when the last handle is dropped.
pub struct DuckDbSession {
    conn: Mutex<Connection>,
    source_catalog: Option<String>,
}

impl DuckDbSession {
    /// Create a new in-memory session
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        log::debug!("Opened in-memory DuckDB session");
        Ok(Self {
            conn: Mutex::new(conn),
            source_catalog: None,
        })
    }

    /// Create a session backed by a database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        log::debug!("Opened DuckDB session on {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            source_catalog: None,
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Apply thread and memory settings.
    pub fn configure(&self, settings: &SessionConfig) -> DbResult<()> {
        let conn = self.lock()?;
        if let Some(threads) = settings.threads {
            conn.execute_batch(&format!("SET threads = {threads}"))?;
        }
        if let Some(limit) = &settings.memory_limit {
            conn.execute_batch(&format!("SET memory_limit = {}", quote_literal(limit)))?;
        }
        log::debug!(
            "Session settings: threads={:?}, memory_limit={:?}",
            settings.threads,
            settings.memory_limit
        );
        Ok(())
    }

    /// Attach a DuckDB database file read-only as catalog [`SOURCE_CATALOG`].
    pub fn attach_source(&mut self, path: &str) -> DbResult<()> {
        if path != ":memory:" && !Path::new(path).exists() {
            return Err(DbError::AttachError {
                path: path.to_string(),
                message: "file does not exist".to_string(),
            });
        }
        let sql = format!(
            "ATTACH {} AS {} (READ_ONLY)",
            quote_literal(path),
            quote_ident(SOURCE_CATALOG)
        );
        self.lock()?
            .execute_batch(&sql)
            .map_err(|e| DbError::AttachError {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        log::info!("Attached source database {path} as '{SOURCE_CATALOG}'");
        self.source_catalog = Some(SOURCE_CATALOG.to_string());
        Ok(())
    }

    /// Catalog the source database is attached under, if any.
    pub fn source_catalog(&self) -> Option<&str> {
        self.source_catalog.as_deref()
    }

    /// Execute multiple SQL statements
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.lock()?
            .execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    /// Count the rows returned by `sql`
    pub fn query_count(&self, sql: &str) -> DbResult<u64> {
        let count: i64 = self
            .lock()?
            .query_row(&format!("SELECT COUNT(*) FROM ({sql})"), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    pub(crate) fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }
}

impl Drop for DuckDbSession {
    fn drop(&mut self) {
        log::debug!("Released DuckDB session");
    }
}

/// Reads a window of rows from a table visible to the session.
pub struct DuckDbSource {
    session: Arc<DuckDbSession>,
    table: String,
    columns: SourceColumns,
}

impl DuckDbSource {
    /// `table` may be schema- or catalog-qualified; each part is quoted.
    pub fn new(session: Arc<DuckDbSession>, table: impl Into<String>, columns: SourceColumns) -> Self {
        Self {
            session,
            table: table.into(),
            columns,
        }
    }

    /// Build a reader for the configured source, qualifying the table with
    /// the attached source catalog when there is one.
    pub fn from_config(session: Arc<DuckDbSession>, source: &SourceConfig) -> Self {
        let table = match session.source_catalog() {
            Some(catalog) => format!("{catalog}.{}", source.table),
            None => source.table.clone(),
        };
        Self::new(session, table, source.columns.clone())
    }

    fn select_sql(&self) -> String {
        let id = quote_ident(&self.columns.id);
        let create_date = quote_ident(&self.columns.create_date);
        let amount = quote_ident(&self.columns.amount);
        let status = quote_ident(&self.columns.status);
        format!(
            "SELECT CAST({id} AS BIGINT) AS id,
                    CAST(CAST({create_date} AS TIMESTAMP) AS VARCHAR) AS create_date,
                    CAST({amount} AS DOUBLE) AS amount,
                    CAST({status} AS VARCHAR) AS status
             FROM {table}
             WHERE CAST({create_date} AS DATE) BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)
             ORDER BY 1",
            table = quote_qualified(&self.table)
        )
    }

    fn read_sync(&self, window_start: NaiveDate, window_end: NaiveDate) -> DbResult<RowSet> {
        let sql = self.select_sql();
        let conn = self.session.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(
                duckdb::params![window_start.to_string(), window_end.to_string()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, create_date, amount, status)| {
                Ok(SourceRow {
                    id,
                    create_date: parse_timestamp(&create_date)?,
                    amount,
                    status,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceReader for DuckDbSource {
    async fn read(&self, window_start: NaiveDate, window_end: NaiveDate) -> DbResult<RowSet> {
        let rows = self.read_sync(window_start, window_end)?;
        log::debug!(
            "Read {} rows from {} for {window_start}..={window_end}",
            rows.len(),
            self.table
        );
        Ok(rows)
    }

    fn source_name(&self) -> &str {
        &self.table
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
