//! Window command implementation
//!
//! Resolves the extraction window for a date; opens neither the ledger nor
//! the source.

use anyhow::{Context, Result};
use ll_core::CalendarWindow;

use crate::cli::{GlobalArgs, OutputFormat, WindowArgs};
use crate::commands::common::{load_project, today};

/// Execute the window command
pub async fn execute(args: &WindowArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let calendar = project.config.calendar;
    let window = CalendarWindow::resolve(calendar, today(args.as_of))
        .context("Failed to resolve extraction window")?;

    match args.output {
        OutputFormat::Text => {
            println!("today:         {}", window.today);
            println!("window:        {}..={}", window.window_start, window.window_end);
            println!("days:          {}", window.day_count());
            println!("month ({calendar}): {}", window.month_id);
            println!("source cutoff: {}", window.source_cutoff_time());
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&window).context("Failed to serialize window")?
        ),
    }
    Ok(())
}
