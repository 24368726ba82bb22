//! Lineage command implementation

use anyhow::{bail, Context, Result};

use crate::cli::{GlobalArgs, LineageArgs, LineageCommands, LineageListArgs, MarkFailedArgs, OutputFormat};
use crate::commands::common::{load_project, now, open_ledger, print_lineage_table, Project};

/// Execute the lineage command
pub async fn execute(args: &LineageArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    match &args.command {
        LineageCommands::List(list_args) => list(list_args, &project),
        LineageCommands::MarkFailed(mark_args) => mark_failed(mark_args, &project),
    }
}

fn list(args: &LineageListArgs, project: &Project) -> Result<()> {
    let ledger = open_ledger(project)?;
    let dataset = project.config.dataset.as_str();
    let records = ledger
        .lineage()
        .recent(dataset, args.limit)
        .context("Failed to read lineage records")?;

    match args.output {
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No lineage records for '{dataset}'.");
            } else {
                print_lineage_table(&records);
            }
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&records).context("Failed to serialize lineage records")?
        ),
    }
    Ok(())
}

fn mark_failed(args: &MarkFailedArgs, project: &Project) -> Result<()> {
    let ledger = open_ledger(project)?;
    let dataset = project.config.dataset.as_str();
    let lineage = ledger.lineage();

    let Some(record) = lineage
        .get(args.key)
        .context("Failed to read lineage record")?
    else {
        bail!("Lineage record {} does not exist", args.key);
    };
    if record.table_name != dataset {
        bail!(
            "Lineage record {} belongs to dataset '{}', not '{dataset}'",
            args.key,
            record.table_name
        );
    }

    lineage
        .mark_failed(args.key, now())
        .with_context(|| format!("Failed to mark lineage record {} as failed", args.key))?;
    println!("Marked lineage record {} for '{dataset}' as failed.", args.key);
    Ok(())
}
