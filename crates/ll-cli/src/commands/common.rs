//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use ll_core::Config;
use ll_db::DuckDbSession;
use ll_ledger::{LedgerDb, LineageRecord};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the session and ledger close cleanly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main maps it to the process status without printing.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Loaded configuration plus the directory relative paths resolve against.
pub(crate) struct Project {
    pub(crate) config: Config,
    pub(crate) root: PathBuf,
}

/// Load the project config from `--config` or the project directory.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load config")?;
    Ok(Project { config, root })
}

/// Open the ledger database, applying pending migrations.
pub(crate) fn open_ledger(project: &Project) -> Result<LedgerDb> {
    let path = project.config.ledger_path(&project.root);
    LedgerDb::new(&path).with_context(|| format!("Failed to open ledger at {path}"))
}

/// Create the run's compute session, configured and with the source attached.
pub(crate) fn open_session(project: &Project) -> Result<Arc<DuckDbSession>> {
    let mut session = DuckDbSession::in_memory().context("Failed to create compute session")?;
    session
        .configure(&project.config.session)
        .context("Failed to apply session settings")?;
    if let Some(source) = project.config.source_path(&project.root) {
        session
            .attach_source(&source)
            .context("Failed to attach source database")?;
    }
    Ok(Arc::new(session))
}

/// The run date: `--as-of` or the local calendar day.
pub(crate) fn today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn fmt_opt_ts(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One table row per lineage record.
pub(crate) fn print_lineage_table(records: &[LineageRecord]) {
    println!(
        "  {:>8}  {:<10}  {:<19}  {:<19}  {:>10}",
        "KEY", "STATUS", "STARTED", "COMPLETED", "ROWS"
    );
    for record in records {
        println!(
            "  {:>8}  {:<10}  {:<19}  {:<19}  {:>10}",
            record.lineage_key,
            record.status().to_string(),
            fmt_opt_ts(Some(record.data_load_started)),
            fmt_opt_ts(record.data_load_completed),
            record
                .row_no
                .map_or_else(|| "-".to_string(), |n| n.to_string())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_prefers_as_of() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 20);
        assert_eq!(today(as_of), as_of.unwrap());
        assert_eq!(today(None), Local::now().date_naive());
    }

    #[test]
    fn test_fmt_opt_ts() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_micro_opt(1, 2, 3, 456)
            .unwrap();
        assert_eq!(fmt_opt_ts(Some(ts)), "2024-03-20 01:02:03");
        assert_eq!(fmt_opt_ts(None), "-");
    }

    #[test]
    fn test_exit_code_displays_nothing() {
        assert_eq!(ExitCode(1).to_string(), "");
    }
}
