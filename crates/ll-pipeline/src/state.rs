//! Pipeline run states

use serde::Serialize;
use std::fmt;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Init,
    WindowResolved,
    LineageOpened,
    Extracted,
    Written,
    Finalized,
    Failed,
}

impl PipelineState {
    /// The state a successful step moves to; `None` from a terminal state.
    pub fn next(self) -> Option<PipelineState> {
        match self {
            PipelineState::Init => Some(PipelineState::WindowResolved),
            PipelineState::WindowResolved => Some(PipelineState::LineageOpened),
            PipelineState::LineageOpened => Some(PipelineState::Extracted),
            PipelineState::Extracted => Some(PipelineState::Written),
            PipelineState::Written => Some(PipelineState::Finalized),
            PipelineState::Finalized | PipelineState::Failed => None,
        }
    }

    pub fn can_advance_to(self, to: PipelineState) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Finalized | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "INIT",
            PipelineState::WindowResolved => "WINDOW_RESOLVED",
            PipelineState::LineageOpened => "LINEAGE_OPENED",
            PipelineState::Extracted => "EXTRACTED",
            PipelineState::Written => "WRITTEN",
            PipelineState::Finalized => "FINALIZED",
            PipelineState::Failed => "FAILED",
        };
        write!(f, "{name}")
    }
}
