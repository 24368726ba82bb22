//! ll-db - Data plane for Ledgerline
//!
//! This crate provides the `SourceReader` and `LakeWriter` traits and their
//! DuckDB implementations: a scoped compute session, a window-bounded source
//! query, and an append-only Parquet lake.

pub mod duckdb;
pub mod error;
pub mod lake;
pub mod rows;
pub mod traits;

pub use duckdb::{DuckDbSession, DuckDbSource};
pub use error::{DbError, DbResult};
pub use lake::{LakePartition, LakeWriteReceipt, ParquetLakeWriter};
pub use rows::{LakeRow, RowSet, SourceRow};
pub use traits::{LakeWriter, SourceReader};
