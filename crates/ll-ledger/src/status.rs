//! Operator-facing summary of a dataset's ledger state.

use crate::cutoff::CutoffRecord;
use crate::lineage::LineageRecord;
use serde::Serialize;

/// Cutoff, last success, and open lineage records for one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStatus {
    pub table_name: String,
    pub cutoff: Option<CutoffRecord>,
    pub last_success: Option<LineageRecord>,
    /// Open records, oldest first
    pub open: Vec<LineageRecord>,
}

impl DatasetStatus {
    /// Whether the next run would trip over an unresolved open record.
    pub fn has_open(&self) -> bool {
        !self.open.is_empty()
    }
}
