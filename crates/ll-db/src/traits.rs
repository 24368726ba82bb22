//! Data plane trait definitions

use crate::error::DbResult;
use crate::lake::{LakePartition, LakeWriteReceipt};
use crate::rows::{LakeRow, RowSet};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Reads the rows of one extraction window from the source system.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Rows whose create date falls in `[window_start, window_end]`, both inclusive.
    async fn read(&self, window_start: NaiveDate, window_end: NaiveDate) -> DbResult<RowSet>;

    /// Source identifier for logging
    fn source_name(&self) -> &str;
}

/// Appends tagged rows to the data lake.
///
/// Append-only: an implementation never overwrites or deduplicates existing data.
#[async_trait]
pub trait LakeWriter: Send + Sync {
    /// Append `rows` under `partition`. An empty slice writes nothing.
    async fn append(
        &self,
        rows: &[LakeRow],
        partition: &LakePartition,
    ) -> DbResult<LakeWriteReceipt>;

    /// Total rows currently stored under `partition`.
    async fn partition_row_count(&self, partition: &LakePartition) -> DbResult<u64>;
}
