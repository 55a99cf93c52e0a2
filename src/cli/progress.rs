//! Terminal output for synchronization runs
//!
//! Spinners while the datasets are fetched, and the plain-text plan and summary
//! printed at the end. Spinners are hidden when stderr is not a terminal.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::app::models::FileAction;
use crate::app::reconcile::{PlannedAction, SyncReport};
use crate::constants::progress;

/// Spinner shown while a dataset is fetched or local files are hashed
pub fn spinner(message: &str, enabled: bool) -> ProgressBar {
    if !enabled || !atty::is(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(progress::SPINNER_TICK_MS));
    bar
}

/// Human readable lines of a dry-run plan; unchanged files are left out
pub fn format_plan(planned: &[PlannedAction]) -> Vec<String> {
    planned
        .iter()
        .filter_map(|entry| match entry.action {
            FileAction::Create => Some(format!("  fetch   {}", entry.id)),
            FileAction::Delete => Some(format!("  delete  {}", entry.id)),
            FileAction::None => None,
        })
        .collect()
}

/// Print a dry-run plan
pub fn print_plan(planned: &[PlannedAction]) {
    let lines = format_plan(planned);
    println!();
    if lines.is_empty() {
        println!("✅ All {} files are up-to-date, nothing to do.", planned.len());
        return;
    }

    println!("📋 Planned changes ({} of {} files):", lines.len(), planned.len());
    for line in lines {
        println!("{}", line);
    }
}

/// Human readable lines of a finished run
pub fn format_summary(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![
        format!("Download rate: {:.2} MB/s", report.rate_mb_per_sec()),
        format!("Total time: {:.2} min", report.minutes()),
        format!(
            "Total size: {:.2} GB ({:.2} MB)",
            report.total_gb(),
            report.total_mb()
        ),
        format!(
            "Files: {} checked, {} updated, {} deleted, {} unchanged",
            report.files_checked, report.created, report.deleted, report.skipped
        ),
    ];
    if report.retried > 0 {
        lines.push(format!("Retried truncated downloads: {}", report.retried));
    }
    if report.failed > 0 {
        lines.push(format!("Failed: {} (see log for details)", report.failed));
    }
    lines
}

/// Print the summary of a finished run
pub fn print_summary(report: &SyncReport) {
    println!();
    if report.failed == 0 {
        println!("✅ All files are up-to-date.");
    } else {
        println!("⚠️  Synchronization finished with failures.");
    }
    for line in format_summary(report) {
        println!("   {}", line);
    }
}
