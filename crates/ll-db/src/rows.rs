//! Row types flowing from the source to the lake.

use chrono::NaiveDateTime;
use ll_core::LocalDate;
use serde::Serialize;

use crate::error::{DbError, DbResult};

/// Timestamp text format produced by `CAST(ts AS VARCHAR)` in DuckDB.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One extracted source row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRow {
    pub id: i64,
    pub create_date: NaiveDateTime,
    pub amount: Option<f64>,
    pub status: Option<String>,
}

/// The rows of one extraction, ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    rows: Vec<SourceRow>,
}

impl RowSet {
    pub fn new(rows: Vec<SourceRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Highest source id in the set; `None` when the set is empty.
    pub fn max_id(&self) -> Option<i64> {
        self.rows.iter().map(|r| r.id).max()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceRow> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[SourceRow] {
        &self.rows
    }
}

impl FromIterator<SourceRow> for RowSet {
    fn from_iter<I: IntoIterator<Item = SourceRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A source row tagged for the lake.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LakeRow {
    pub id: i64,
    pub create_date: NaiveDateTime,
    pub amount: Option<f64>,
    pub status: Option<String>,
    /// Local-calendar date of `create_date`, `YYYY-MM-DD`
    pub local_date: String,
    /// Local-calendar `YYYY-MM` of `create_date`
    pub month_id: String,
    /// Lineage record of the load that wrote this row
    pub lineage_key: i64,
}

impl LakeRow {
    /// Tag `row` with its local date and the current lineage key.
    pub fn tag(row: &SourceRow, local: LocalDate, lineage_key: i64) -> Self {
        Self {
            id: row.id,
            create_date: row.create_date,
            amount: row.amount,
            status: row.status.clone(),
            local_date: local.to_string(),
            month_id: local.month_id(),
            lineage_key,
        }
    }
}

pub(crate) fn parse_timestamp(text: &str) -> DbResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|e| DbError::InvalidRow(format!("bad timestamp '{text}': {e}")))
}

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
