use std::fs::File;
use std::io::{Result, Write, stdout};
use std::path::Path;

use crossterm::execute;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use serde::Serialize;
use serde_json::to_string_pretty;

use crate::chain::aggregator::Statistics;
use crate::chain::fetcher::FetchSummary;
use crate::chain::reconciler::ReconcileSummary;

/// Saves any serializable report to `path` as pretty JSON.
///
/// # Parameters
/// - `report`: The value to be saved.
/// - `path`: Destination file, created or truncated.
///
/// # Returns
/// A Result indicating whether the save was successful.
pub fn save_json<T: Serialize>(report: &T, path: &Path) -> Result<()> {
    let json: String = to_string_pretty(report)?;
    let mut file: File = File::create(path)?;

    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    return Ok(());
}

fn heading(title: &str, color: Color) -> Result<()> {
    return execute!(stdout(), SetForegroundColor(color), Print(format!("{}\n", title)), ResetColor);
}

pub fn print_fetch_summary(summary: &FetchSummary) -> Result<()> {
    heading("Bulk fetch:", Color::Green)?;
    println!("  | Steps walked: {}", summary.steps);
    println!("  | Pages appended: {} ({} records)", summary.pages_appended, summary.records_appended);
    if summary.exhausted.is_empty() {
        println!("  | Every step succeeded");
    } else {
        execute!(stdout(), SetForegroundColor(Color::Yellow))?;
        println!("  | {} step(s) exhausted their retries, run reconcile to fill the gaps", summary.exhausted.len());
        execute!(stdout(), ResetColor)?;
    }
    return Ok(());
}

pub fn print_reconcile_summary(summary: &ReconcileSummary) -> Result<()> {
    heading("Gap reconciliation:", Color::Green)?;
    println!("  | Distinct indices before: {}", summary.observed);
    println!("  | Missing indices: {}", summary.missing.len());
    println!("  | Records recovered: {}", summary.recovered_records);
    if !summary.still_missing.is_empty() {
        execute!(stdout(), SetForegroundColor(Color::Yellow))?;
        let preview: Vec<String> = summary.still_missing.iter().take(10).map(|i| i.to_string()).collect();
        let more: &str = if summary.still_missing.len() > 10 { ", ..." } else { "" };
        println!(
            "  | Still missing: {} [{}{}], run reconcile again",
            summary.still_missing.len(),
            preview.join(", "),
            more
        );
        execute!(stdout(), ResetColor)?;
    }
    return Ok(());
}

pub fn print_statistics(stats: &Statistics) -> Result<()> {
    heading("Block intervals:", Color::Cyan)?;
    println!("  | Records: {} ({} intervals)", stats.record_count, stats.delta_count);
    println!("  | Mean interval: {:.2} min", stats.mean);
    println!("  | Standard deviation: {:.2} min", stats.stdev);
    println!("  | Shortest / longest: {:.2} / {:.2} min", stats.min_delta, stats.max_delta);
    heading(&format!("Intervals of {} min or more:", stats.threshold_min), Color::Cyan)?;
    println!("  | Count: {}", stats.long_gap_count);
    println!("  | Normal model probability: {:e}", stats.theoretical_tail_prob);
    println!("  | Observed probability: {:e}", stats.empirical_tail_prob);
    println!(
        "  | Expected one every {} hours ({:.1} days)",
        stats.hours_between_long_gaps, stats.days_between_long_gaps
    );
    return Ok(());
}
