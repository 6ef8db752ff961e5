//! Progress reporting for the walker CLI
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::config::WalkConfig;
use crate::walker::{WalkProgress, WalkResult};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays walk status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        let spinner = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &WalkProgress) {
        self.bar.set_message(progress_line(progress));
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// One-line rendering of a progress snapshot
fn progress_line(progress: &WalkProgress) -> String {
    format!(
        "Items: {} | Rate: {:.0}/s | Queue: {} | Busy: {} | Workers: {}/{}",
        format_number(progress.items),
        progress.items_per_second(),
        progress.queue_size,
        progress.active_workers,
        progress.running_workers,
        progress.total_workers,
    )
}

/// Print the state of a walk that is being left running
pub fn print_detached(progress: &WalkProgress) {
    println!();
    println!("{}", style("Walk Detached").yellow().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {}", progress_line(progress));
    println!();
}

/// Print a summary of the walk results
pub fn print_summary(result: &WalkResult) {
    let totals = &result.totals;
    let title = if result.completed {
        style("Walk Complete").green().bold()
    } else {
        style("Walk Interrupted").yellow().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Directories:").bold(), format_number(totals.items));
    println!("  {} {}", style("Files:").bold(), format_number(totals.leaves));
    println!(
        "  {} {:.1}s ({:.0} dirs/sec)",
        style("Duration:").bold(),
        result.duration.as_secs_f64(),
        result.items_per_second()
    );
    println!("  {} {}", style("Workers:").bold(), result.workers);
    if totals.skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped:").yellow().bold(),
            format_number(totals.skipped)
        );
    }
    if totals.errors > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(totals.errors)
        );
    }
    if !result.worker_faults.is_empty() {
        println!(
            "  {} {}",
            style("Worker faults:").red().bold(),
            result.worker_faults.len()
        );
    }
    println!();
}

/// Print a header at the start of the walk
pub fn print_header(config: &WalkConfig) {
    println!();
    println!(
        "{} {}",
        style("par-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), config.root.display());
    println!(
        "  {} {} ({})",
        style("Workers:").bold(),
        config.worker_count,
        config.backend
    );
    println!("  {} {}", style("Mode:").bold(), config.mode.as_str());
    if let Some(depth) = config.max_depth {
        println!("  {} {}", style("Max depth:").bold(), depth);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_progress_line() {
        let progress = WalkProgress {
            items: 12000,
            queue_size: 7,
            active_workers: 2,
            running_workers: 3,
            total_workers: 4,
            elapsed: Duration::from_secs(4),
        };

        assert_eq!(
            progress_line(&progress),
            "Items: 12,000 | Rate: 3000/s | Queue: 7 | Busy: 2 | Workers: 3/4"
        );
    }
}
