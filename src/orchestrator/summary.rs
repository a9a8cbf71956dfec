//! Aggregate result of one load run

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::loader::{LoadRecord, LoadStatus, format_duration};

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            "cancelled" => Ok(RunStatus::Cancelled),
            _ => Err(format!("Invalid run status: {}", s)),
        }
    }
}

/// Summary of one orchestrator run, with load records in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// From the first dataset's start to the last dataset's end
    pub duration: Duration,
    pub records: Vec<LoadRecord>,
}

impl RunSummary {
    /// Start a summary for a new run
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            duration: Duration::ZERO,
            records: Vec::new(),
        }
    }

    /// Append a finished load record
    pub fn push(&mut self, record: LoadRecord) {
        self.records.push(record);
    }

    /// Mark the run finished
    pub fn finish(&mut self, status: RunStatus, duration: Duration) {
        self.status = status;
        self.duration = duration;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Find the record of a dataset
    pub fn record(&self, dataset: &str) -> Option<&LoadRecord> {
        self.records.iter().find(|r| r.dataset == dataset)
    }

    /// Records that loaded successfully
    pub fn succeeded(&self) -> impl Iterator<Item = &LoadRecord> {
        self.records.iter().filter(|r| r.status == LoadStatus::Success)
    }

    /// Total rows written across all successful loads
    pub fn total_rows(&self) -> u64 {
        self.succeeded().map(|r| r.rows_loaded).sum()
    }

    /// Longest single dataset load
    pub fn max_duration(&self) -> Duration {
        self.records
            .iter()
            .map(|r| r.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        format_duration(self.duration)
    }

    /// Print summary to stderr
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("Bronze load {} - {}", self.run_id, self.status);
        eprintln!("Duration: {}", self.duration_formatted());
        eprintln!(
            "Datasets loaded: {}/{}",
            self.succeeded().count(),
            self.records.len()
        );

        for record in &self.records {
            eprintln!(
                "  - {}: {} ({} rows, {})",
                record.dataset,
                record.status,
                record.rows_loaded,
                record.duration_string()
            );
        }
    }
}
