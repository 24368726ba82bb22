//! ll-pipeline - One incremental load of one dataset.
//!
//! A run moves through `INIT → WINDOW_RESOLVED → LINEAGE_OPENED → EXTRACTED
//! → WRITTEN → FINALIZED`, or to `FAILED` from any non-terminal state. The
//! lineage record is opened before any data moves and finalized, together
//! with the cutoff, only after the lake append is durable.

pub mod error;
pub mod pipeline;
pub mod state;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineRun, RunReport};
pub use state::PipelineState;
