//! Pipeline runner
//!
//! [`Pipeline`] holds the collaborators of one dataset; [`PipelineRun`] walks
//! a single run through its states. Each step is individually invocable so
//! callers (and tests) can stop a run at any point.

use crate::error::{PipelineError, PipelineResult};
use crate::state::PipelineState;
use chrono::{Local, NaiveDate};
use ll_core::{CalendarWindow, DatasetName, LocalCalendar};
use ll_db::{LakePartition, LakeRow, LakeWriteReceipt, LakeWriter, RowSet, SourceReader};
use ll_ledger::{CutoffRecord, LedgerDb, LedgerError, LedgerResult, LoadCompletion};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a run needs for one dataset.
pub struct Pipeline<'a> {
    dataset: DatasetName,
    calendar: LocalCalendar,
    ledger: &'a LedgerDb,
    reader: Arc<dyn SourceReader>,
    writer: Arc<dyn LakeWriter>,
    lake_root: PathBuf,
}

/// Summary of a finalized run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dataset: String,
    pub window: CalendarWindow,
    pub lineage_key: i64,
    pub rows_written: u64,
    pub part_file: Option<PathBuf>,
    pub cutoff: CutoffRecord,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        dataset: DatasetName,
        calendar: LocalCalendar,
        ledger: &'a LedgerDb,
        reader: Arc<dyn SourceReader>,
        writer: Arc<dyn LakeWriter>,
        lake_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dataset,
            calendar,
            ledger,
            reader,
            writer,
            lake_root: lake_root.into(),
        }
    }

    /// Start a run for `today` in state `INIT`.
    pub fn start(&self, today: NaiveDate) -> PipelineRun<'_> {
        PipelineRun {
            pipeline: self,
            today,
            state: PipelineState::Init,
            window: None,
            lineage_key: None,
            rows: None,
            receipt: None,
            cutoff: None,
        }
    }

    /// Drive a run for `today` through every step.
    pub async fn run(&self, today: NaiveDate) -> PipelineResult<RunReport> {
        let mut run = self.start(today);
        run.resolve_window()?;
        run.open_lineage()?;
        run.extract().await?;
        run.write().await?;
        run.finalize()?;
        run.report().ok_or(PipelineError::InvalidTransition {
            from: run.state(),
            to: PipelineState::Finalized,
        })
    }
}

/// A single run in progress.
pub struct PipelineRun<'p> {
    pipeline: &'p Pipeline<'p>,
    today: NaiveDate,
    state: PipelineState,
    window: Option<CalendarWindow>,
    lineage_key: Option<i64>,
    rows: Option<RowSet>,
    receipt: Option<LakeWriteReceipt>,
    cutoff: Option<CutoffRecord>,
}

impl<'p> PipelineRun<'p> {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn window(&self) -> Option<&CalendarWindow> {
        self.window.as_ref()
    }

    /// Key of the lineage record this run opened.
    pub fn lineage_key(&self) -> Option<i64> {
        self.lineage_key
    }

    /// `INIT → WINDOW_RESOLVED`
    pub fn resolve_window(&mut self) -> PipelineResult<&CalendarWindow> {
        self.enter(PipelineState::WindowResolved)?;
        let window = CalendarWindow::resolve(self.pipeline.calendar, self.today)
            .map_err(PipelineError::WindowResolution);
        let window = self.settle(window)?;

        log::info!(
            "Window for '{}': {}..={} (month {})",
            self.pipeline.dataset,
            window.window_start,
            window.window_end,
            window.month_id
        );
        Ok(self.window.insert(window))
    }

    /// `WINDOW_RESOLVED → LINEAGE_OPENED`
    pub fn open_lineage(&mut self) -> PipelineResult<i64> {
        self.enter(PipelineState::LineageOpened)?;
        let opened = self.open_and_confirm();
        let key = self.settle(opened)?;
        log::info!("Opened lineage {key} for '{}'", self.pipeline.dataset);
        self.lineage_key = Some(key);
        Ok(key)
    }

    /// `LINEAGE_OPENED → EXTRACTED`
    pub async fn extract(&mut self) -> PipelineResult<&RowSet> {
        self.enter(PipelineState::Extracted)?;
        let (window, lineage_key) = self.opened_context()?;
        let rows = self
            .pipeline
            .reader
            .read(window.window_start, window.window_end)
            .await
            .map_err(|source| PipelineError::Extraction {
                lineage_key,
                source,
            });
        let rows = self.settle(rows)?;

        log::info!(
            "Extracted {} rows from {} (max id {:?})",
            rows.len(),
            self.pipeline.reader.source_name(),
            rows.max_id()
        );
        Ok(self.rows.insert(rows))
    }

    /// `EXTRACTED → WRITTEN`
    pub async fn write(&mut self) -> PipelineResult<&LakeWriteReceipt> {
        self.enter(PipelineState::Written)?;
        let (window, lineage_key) = self.opened_context()?;
        let tagged = self.tag_rows(&window, lineage_key);
        let tagged = self.settle(tagged)?;

        let partition = LakePartition::new(&self.pipeline.lake_root, &window.month_id);
        let receipt = self
            .pipeline
            .writer
            .append(&tagged, &partition)
            .await
            .map_err(|source| PipelineError::Write {
                lineage_key,
                source,
            });
        let receipt = self.settle(receipt)?;
        Ok(self.receipt.insert(receipt))
    }

    /// `WRITTEN → FINALIZED`
    ///
    /// Finalizes the lineage record and advances the cutoff in one ledger
    /// transaction. A failure here leaves the appended rows in the lake with
    /// the record still open; reconciling that is a manual operator task.
    pub fn finalize(&mut self) -> PipelineResult<&CutoffRecord> {
        self.enter(PipelineState::Finalized)?;
        let (window, lineage_key) = self.opened_context()?;
        let (row_count, max_id) = self
            .rows
            .as_ref()
            .map_or((0, None), |rows| (rows.len() as i64, rows.max_id()));

        let completion = LoadCompletion {
            table_name: self.pipeline.dataset.as_str(),
            lineage_key,
            completed_at: Local::now().naive_local(),
            source_cutoff_time: window.source_cutoff_time(),
            row_count,
            max_id,
        };
        let completed = self
            .pipeline
            .ledger
            .complete_load(&completion)
            .map_err(|source| {
                log::error!(
                    "Rows for lineage {lineage_key} are in the lake but bookkeeping failed; \
                     the record stays open for manual reconciliation"
                );
                PipelineError::LedgerWrite {
                    lineage_key: Some(lineage_key),
                    source,
                }
            });
        let cutoff = self.settle(completed)?;

        log::info!(
            "Finalized lineage {lineage_key}: {row_count} rows, cutoff {} / {:?}",
            cutoff.cutoff_time,
            cutoff.cutoff_id
        );
        Ok(self.cutoff.insert(cutoff))
    }

    /// Summary once the run is `FINALIZED`.
    pub fn report(&self) -> Option<RunReport> {
        if self.state != PipelineState::Finalized {
            return None;
        }
        let receipt = self.receipt.as_ref()?;
        Some(RunReport {
            dataset: self.pipeline.dataset.to_string(),
            window: self.window.clone()?,
            lineage_key: self.lineage_key?,
            rows_written: receipt.rows_written,
            part_file: receipt.path.clone(),
            cutoff: self.cutoff.clone()?,
        })
    }

    /// Check the step is legal from the current state.
    fn enter(&mut self, to: PipelineState) -> PipelineResult<()> {
        if self.state.can_advance_to(to) {
            return Ok(());
        }
        let from = self.state;
        if !from.is_terminal() {
            self.state = PipelineState::Failed;
        }
        log::warn!("Rejected pipeline step {from} -> {to}");
        Err(PipelineError::InvalidTransition { from, to })
    }

    /// Record the outcome of the step `enter` admitted.
    fn settle<T>(&mut self, outcome: PipelineResult<T>) -> PipelineResult<T> {
        match outcome {
            Ok(value) => {
                if let Some(next) = self.state.next() {
                    self.state = next;
                }
                Ok(value)
            }
            Err(e) => {
                log::error!("Pipeline run failed in state {}: {e}", self.state);
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    /// Open this run's record and confirm it is the dataset's only open one.
    fn open_and_confirm(&self) -> PipelineResult<i64> {
        let table_name = self.pipeline.dataset.as_str();
        let lineage = self.pipeline.ledger.lineage();
        let opened = lineage
            .open(table_name)
            .map_err(|source| PipelineError::LedgerWrite {
                lineage_key: None,
                source,
            })?;

        let prior_keys = match lineage.current_open_key(table_name) {
            Ok(key) if key == opened => return Ok(opened),
            Ok(other) => vec![other],
            Err(LedgerError::AmbiguousLineage { open_keys, .. }) => open_keys
                .into_iter()
                .filter(|key| *key != opened)
                .collect(),
            Err(source) => {
                return Err(PipelineError::LedgerWrite {
                    lineage_key: Some(opened),
                    source,
                })
            }
        };

        // Close our own record so only the unresolved ones remain open
        let closed = lineage.mark_failed(opened, Local::now().naive_local());
        Err(PipelineError::AmbiguousLineage {
            table_name: table_name.to_string(),
            open_keys: unresolved_keys(prior_keys, opened, closed),
        })
    }

    fn opened_context(&self) -> PipelineResult<(CalendarWindow, i64)> {
        match (&self.window, self.lineage_key) {
            (Some(window), Some(key)) => Ok((window.clone(), key)),
            _ => Err(PipelineError::InvalidTransition {
                from: self.state,
                to: self.state.next().unwrap_or(PipelineState::Failed),
            }),
        }
    }

    /// Tag every extracted row with its local date and the run's lineage key.
    fn tag_rows(&self, window: &CalendarWindow, lineage_key: i64) -> PipelineResult<Vec<LakeRow>> {
        let Some(rows) = &self.rows else {
            return Ok(Vec::new());
        };
        let calendar = self.pipeline.calendar;
        rows.iter()
            .map(|row| {
                let local = calendar
                    .to_local(row.create_date.date())
                    .map_err(|source| PipelineError::RowTagging {
                        lineage_key,
                        source,
                    })?;
                let tagged = LakeRow::tag(row, local, lineage_key);
                if tagged.month_id != window.month_id {
                    return Err(PipelineError::RowOutsideWindow {
                        lineage_key,
                        id: row.id,
                        month_id: tagged.month_id,
                        expected: window.month_id.clone(),
                    });
                }
                Ok(tagged)
            })
            .collect()
    }
}

/// Open keys an operator must resolve after an ambiguous open.
///
/// `opened` stays on the list when closing it failed.
fn unresolved_keys(mut prior_keys: Vec<i64>, opened: i64, closed: LedgerResult<()>) -> Vec<i64> {
    if let Err(e) = closed {
        log::warn!("Could not close lineage {opened} after detecting open records: {e}");
        prior_keys.push(opened);
        prior_keys.sort_unstable();
    }
    prior_keys
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
