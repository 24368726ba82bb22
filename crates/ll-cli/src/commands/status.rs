//! Status command implementation
//!
//! Exits with code 1 when an open lineage record is older than
//! `lineage.stale_after_hours`.

use anyhow::{Context, Result};
use ll_core::CalendarWindow;
use ll_db::{DuckDbSession, LakePartition, LakeWriter, ParquetLakeWriter};
use ll_ledger::{DatasetStatus, LineageRecord};
use serde::Serialize;
use std::sync::Arc;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{
    fmt_opt_ts, load_project, now, open_ledger, print_lineage_table, today, ExitCode, Project,
};

/// Row count of the partition the next run appends to.
#[derive(Debug, Serialize)]
struct PartitionSummary {
    month_id: String,
    rows: u64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    #[serde(flatten)]
    status: DatasetStatus,
    stale_after_hours: u32,
    stale_keys: Vec<i64>,
    recent: Vec<LineageRecord>,
    current_partition: Option<PartitionSummary>,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let ledger = open_ledger(&project)?;
    let config = &project.config;
    let dataset = config.dataset.as_str();

    let status = ledger
        .dataset_status(dataset)
        .context("Failed to read ledger status")?;
    let recent = ledger
        .lineage()
        .recent(dataset, args.recent)
        .context("Failed to read lineage records")?;
    let stale_keys: Vec<i64> = ledger
        .lineage()
        .stale_open(dataset, now(), config.lineage.stale_after())
        .context("Failed to read stale lineage records")?
        .iter()
        .map(|r| r.lineage_key)
        .collect();

    let report = StatusReport {
        current_partition: current_partition(&project).await?,
        stale_after_hours: config.lineage.stale_after_hours,
        stale_keys,
        recent,
        status,
    };

    match args.output {
        OutputFormat::Text => print_status(&report),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize status")?
        ),
    }

    if !report.stale_keys.is_empty() {
        log::warn!(
            "Stale open lineage records for '{dataset}': {:?}",
            report.stale_keys
        );
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// Count rows in the partition today's window writes to.
async fn current_partition(project: &Project) -> Result<Option<PartitionSummary>> {
    let Ok(window) = CalendarWindow::resolve(project.config.calendar, today(None)) else {
        return Ok(None);
    };
    let partition = LakePartition::new(project.config.lake_root(&project.root), &window.month_id);
    let session =
        Arc::new(DuckDbSession::in_memory().context("Failed to create compute session")?);
    let rows = ParquetLakeWriter::new(session)
        .partition_row_count(&partition)
        .await
        .with_context(|| format!("Failed to read lake partition {}", partition.dir_name()))?;
    Ok(Some(PartitionSummary {
        month_id: window.month_id,
        rows,
    }))
}

fn print_status(report: &StatusReport) {
    let status = &report.status;
    println!("Dataset: {}", status.table_name);

    match &status.cutoff {
        Some(cutoff) => println!(
            "  cutoff:        {} / id {}",
            cutoff.cutoff_time,
            cutoff
                .cutoff_id
                .map_or_else(|| "-".to_string(), |id| id.to_string())
        ),
        None => println!("  cutoff:        (no completed load)"),
    }
    match &status.last_success {
        Some(record) => println!(
            "  last success:  lineage {} at {} ({} rows)",
            record.lineage_key,
            fmt_opt_ts(record.data_load_completed),
            record.row_no.unwrap_or(0)
        ),
        None => println!("  last success:  -"),
    }
    if let Some(partition) = &report.current_partition {
        println!(
            "  lake:          MonthID={} holds {} rows",
            partition.month_id, partition.rows
        );
    }

    if status.has_open() {
        let keys: Vec<String> = status.open.iter().map(|r| r.lineage_key.to_string()).collect();
        println!("  open:          {}", keys.join(", "));
    }
    for key in &report.stale_keys {
        println!(
            "  STALE: lineage {key} has been open for more than {}h; \
             resolve with `ll lineage mark-failed {key}`",
            report.stale_after_hours
        );
    }

    if !report.recent.is_empty() {
        println!();
        print_lineage_table(&report.recent);
    }
}
