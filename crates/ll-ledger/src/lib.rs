//! Ledger database for Ledgerline.
//!
//! Provides a DuckDB-backed store for the two bookkeeping tables of an
//! incremental load: the per-dataset **cutoff** watermark and the
//! append-only **lineage** log of load attempts. Every statement binds its
//! values as parameters.

pub mod connection;
pub mod cutoff;
pub mod ddl;
pub mod error;
pub mod lineage;
pub mod migration;
pub(crate) mod row_helpers;
pub mod status;

pub use connection::{LedgerDb, LoadCompletion};
pub use cutoff::{CutoffLedger, CutoffRecord};
pub use error::{LedgerError, LedgerResult};
pub use lineage::{LineageLedger, LineageRecord, LineageStatus};
pub use status::DatasetStatus;
