//! Per-attempt load records

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, LoadError};

/// Status of one dataset load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// Load has started but not finished
    Pending,
    /// Sink holds the full source content
    Success,
    /// Load failed and the sink was left cleared
    Failed,
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Pending => write!(f, "pending"),
            LoadStatus::Success => write!(f, "success"),
            LoadStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for LoadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(LoadStatus::Pending),
            "success" => Ok(LoadStatus::Success),
            "failed" => Ok(LoadStatus::Failed),
            _ => Err(format!("Invalid load status: {}", s)),
        }
    }
}

/// Outcome of one attempt to load one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRecord {
    /// Dataset name
    pub dataset: String,
    /// Sink the dataset loads into
    pub sink: String,
    /// Current status
    pub status: LoadStatus,
    /// When the attempt started
    pub started_at: DateTime<Utc>,
    /// When the attempt ended
    pub finished_at: Option<DateTime<Utc>>,
    /// Elapsed time measured on the monotonic clock
    pub duration: Duration,
    /// Rows written to the sink
    pub rows_loaded: u64,
    /// Rows removed by the clear step
    pub rows_cleared: u64,
    /// Failure classification
    pub error_kind: Option<ErrorKind>,
    /// Failure message
    pub error: Option<String>,
}

impl LoadRecord {
    /// Start a new pending record
    pub fn start(dataset: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            sink: sink.into(),
            status: LoadStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            duration: Duration::ZERO,
            rows_loaded: 0,
            rows_cleared: 0,
            error_kind: None,
            error: None,
        }
    }

    /// Mark the load as successful
    pub fn succeed(&mut self, rows_loaded: u64, duration: Duration) {
        self.status = LoadStatus::Success;
        self.rows_loaded = rows_loaded;
        self.duration = duration;
        self.finished_at = Some(Utc::now());
    }

    /// Mark the load as failed; the sink holds no rows afterwards
    pub fn fail(&mut self, error: &LoadError, duration: Duration) {
        self.status = LoadStatus::Failed;
        self.rows_loaded = 0;
        self.error_kind = Some(error.kind());
        self.error = Some(error.to_string());
        self.duration = duration;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.status == LoadStatus::Success
    }

    /// Get rows per second throughput
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.rows_loaded as f64 / secs
        }
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        format_duration(self.duration)
    }
}

/// Format a duration with sub-second precision
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{:.3}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
