//! Terminal progress for load runs
//!
//! Renders a dataset progress bar with `indicatif`, printing one line per
//! finished dataset above the bar.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::observer::LoadObserver;
use super::report::FailureReport;
use super::summary::RunSummary;
use crate::loader::{LoadError, LoadRecord};
use crate::registry::DatasetDefinition;

/// Observer drawing a progress bar over the datasets of a run
pub struct ProgressObserver {
    bar: ProgressBar,
    rows: AtomicU64,
}

impl ProgressObserver {
    /// Create a progress bar drawn to stderr
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>2}/{len:2} datasets {msg}",
            )
            .unwrap()
            .progress_chars("█▓▒░  "),
        );
        Self::with_bar(bar)
    }

    /// Create an observer that draws nothing
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            rows: AtomicU64::new(0),
        }
    }

    /// Rows loaded so far in this run
    pub fn rows_loaded(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    /// Datasets finished so far in this run
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadObserver for ProgressObserver {
    fn run_started(&self, _run_id: &str, datasets: usize) {
        self.rows.store(0, Ordering::Relaxed);
        self.bar.set_length(datasets as u64);
        self.bar.set_position(0);
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn group_started(&self, group: &str, datasets: usize) {
        self.bar
            .println(format!("Source group {} ({} datasets)", group, datasets));
    }

    fn dataset_started(&self, definition: &DatasetDefinition) {
        self.bar.set_message(definition.name().to_string());
    }

    fn dataset_loaded(&self, record: &LoadRecord) {
        self.rows.fetch_add(record.rows_loaded, Ordering::Relaxed);
        self.bar.println(format!(
            "  ✓ {}: {} rows in {}",
            record.dataset,
            format_number(record.rows_loaded),
            record.duration_string()
        ));
        self.bar.inc(1);
    }

    fn dataset_failed(&self, record: &LoadRecord, error: &LoadError) {
        self.bar
            .println(format!("  ✗ {}: {}", record.dataset, error.kind()));
    }

    fn run_completed(&self, summary: &RunSummary) {
        self.bar.finish_with_message(format!(
            "✓ {} rows in {}",
            format_number(self.rows_loaded()),
            summary.duration_formatted()
        ));
    }

    fn run_aborted(&self, report: &FailureReport) {
        self.bar
            .abandon_with_message(format!("✗ {} failed", report.dataset));
    }

    fn run_cancelled(&self, _summary: &RunSummary) {
        self.bar.abandon_with_message("⊘ Cancelled".to_string());
    }
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
