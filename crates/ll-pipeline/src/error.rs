//! Error types for ll-pipeline

use crate::state::PipelineState;
use ll_core::CoreError;
use ll_db::DbError;
use ll_ledger::LedgerError;
use thiserror::Error;

/// Pipeline run errors
///
/// Every variant raised after the lineage record is opened carries its key;
/// that record stays open until an operator resolves it.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The extraction window could not be computed; nothing was touched (P001)
    #[error("[P001] Cannot resolve extraction window: {0}")]
    WindowResolution(#[source] CoreError),

    /// Ledger write failed (P002)
    #[error("[P002] Ledger write failed{}: {source}", fmt_key(.lineage_key))]
    LedgerWrite {
        lineage_key: Option<i64>,
        #[source]
        source: LedgerError,
    },

    /// Prior loads left open lineage records (P003)
    #[error(
        "[P003] Dataset '{table_name}' has unresolved open lineage records {open_keys:?}; \
         resolve them with `ll lineage mark-failed <KEY>` before the next run"
    )]
    AmbiguousLineage {
        table_name: String,
        open_keys: Vec<i64>,
    },

    /// Source read failed (P004)
    #[error("[P004] Extraction failed for lineage {lineage_key}: {source}")]
    Extraction {
        lineage_key: i64,
        #[source]
        source: DbError,
    },

    /// Lake append failed (P005)
    #[error("[P005] Lake write failed for lineage {lineage_key}: {source}")]
    Write {
        lineage_key: i64,
        #[source]
        source: DbError,
    },

    /// A row's local date could not be computed (P006)
    #[error("[P006] Cannot tag rows for lineage {lineage_key}: {source}")]
    RowTagging {
        lineage_key: i64,
        #[source]
        source: CoreError,
    },

    /// The source returned a row outside the window's month (P007)
    #[error(
        "[P007] Source row {id} falls in month {month_id}, outside window month {expected} \
         (lineage {lineage_key})"
    )]
    RowOutsideWindow {
        lineage_key: i64,
        id: i64,
        month_id: String,
        expected: String,
    },

    /// Step invoked out of order (P008)
    #[error("[P008] Invalid pipeline transition: {from} -> {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Lineage record left open by this failure, if one was opened.
    pub fn lineage_key(&self) -> Option<i64> {
        match self {
            PipelineError::LedgerWrite { lineage_key, .. } => *lineage_key,
            PipelineError::Extraction { lineage_key, .. }
            | PipelineError::Write { lineage_key, .. }
            | PipelineError::RowTagging { lineage_key, .. }
            | PipelineError::RowOutsideWindow { lineage_key, .. } => Some(*lineage_key),
            PipelineError::WindowResolution(_)
            | PipelineError::AmbiguousLineage { .. }
            | PipelineError::InvalidTransition { .. } => None,
        }
    }
}

fn fmt_key(lineage_key: &Option<i64>) -> String {
    lineage_key
        .map(|key| format!(" for lineage {key}"))
        .unwrap_or_default()
}
