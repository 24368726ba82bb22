//! Run command implementation

use anyhow::{Context, Result};
use ll_db::{DuckDbSource, ParquetLakeWriter};
use ll_pipeline::{Pipeline, RunReport};
use std::sync::Arc;

use crate::cli::{GlobalArgs, OutputFormat, RunArgs};
use crate::commands::common::{load_project, open_ledger, open_session, today};

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let ledger = open_ledger(&project)?;
    let session = open_session(&project)?;
    let config = &project.config;

    let reader = Arc::new(DuckDbSource::from_config(session.clone(), &config.source));
    let writer = Arc::new(ParquetLakeWriter::new(session));
    let pipeline = Pipeline::new(
        config.dataset.clone(),
        config.calendar,
        &ledger,
        reader,
        writer,
        config.lake_root(&project.root),
    );

    let today = today(args.as_of);
    log::debug!("Running '{}' as of {today}", config.dataset);

    let report = match pipeline.run(today).await {
        Ok(report) => report,
        Err(err) => {
            if let Some(key) = err.lineage_key() {
                eprintln!(
                    "Lineage record {key} was left open. Inspect the lake, then close it with \
                     `ll lineage mark-failed {key}`."
                );
            }
            return Err(err).with_context(|| format!("Load of '{}' failed", config.dataset));
        }
    };

    match args.output {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize run report")?
        ),
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let window = &report.window;
    println!(
        "Loaded '{}' for {}..={} (month {})",
        report.dataset, window.window_start, window.window_end, window.month_id
    );
    println!("  lineage:  {}", report.lineage_key);
    println!("  rows:     {}", report.rows_written);
    match &report.part_file {
        Some(path) => println!("  file:     {}", path.display()),
        None => println!("  file:     (nothing written)"),
    }
    println!(
        "  cutoff:   {} / id {}",
        report.cutoff.cutoff_time,
        report
            .cutoff
            .cutoff_id
            .map_or_else(|| "-".to_string(), |id| id.to_string())
    );
}
