//! Lifecycle notifications emitted during a run

use tracing::{debug, error, info, warn};

use super::report::FailureReport;
use super::summary::RunSummary;
use crate::loader::{LoadError, LoadRecord};
use crate::registry::DatasetDefinition;

/// Receives run lifecycle events; every method defaults to a no-op
pub trait LoadObserver: Send + Sync {
    fn run_started(&self, _run_id: &str, _datasets: usize) {}

    fn group_started(&self, _group: &str, _datasets: usize) {}

    fn dataset_started(&self, _definition: &DatasetDefinition) {}

    /// The sink was emptied and the removal committed
    fn dataset_cleared(&self, _definition: &DatasetDefinition, _rows_cleared: u64) {}

    fn dataset_loaded(&self, _record: &LoadRecord) {}

    fn dataset_failed(&self, _record: &LoadRecord, _error: &LoadError) {}

    fn run_completed(&self, _summary: &RunSummary) {}

    fn run_aborted(&self, _report: &FailureReport) {}

    fn run_cancelled(&self, _summary: &RunSummary) {}
}

/// Ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LoadObserver for NoopObserver {}

/// Turns lifecycle events into structured tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn run_started(&self, run_id: &str, datasets: usize) {
        info!(run_id, datasets, "Starting bronze load");
    }

    fn group_started(&self, group: &str, datasets: usize) {
        info!(group, datasets, "Loading source group");
    }

    fn dataset_started(&self, definition: &DatasetDefinition) {
        info!(
            dataset = definition.name(),
            sink = %definition.sink(),
            source = %definition.source(),
            "Loading dataset"
        );
    }

    fn dataset_cleared(&self, definition: &DatasetDefinition, rows_cleared: u64) {
        debug!(dataset = definition.name(), rows_cleared, "Sink cleared");
    }

    fn dataset_loaded(&self, record: &LoadRecord) {
        info!(
            dataset = %record.dataset,
            rows = record.rows_loaded,
            duration_ms = record.duration.as_millis() as u64,
            "Dataset loaded"
        );
    }

    fn dataset_failed(&self, record: &LoadRecord, error: &LoadError) {
        error!(
            dataset = %record.dataset,
            kind = %error.kind(),
            error = %error,
            "Dataset load failed"
        );
    }

    fn run_completed(&self, summary: &RunSummary) {
        info!(
            run_id = %summary.run_id,
            datasets = summary.records.len(),
            rows = summary.total_rows(),
            duration_ms = summary.duration.as_millis() as u64,
            "Bronze load completed"
        );
    }

    fn run_aborted(&self, report: &FailureReport) {
        error!(
            dataset = %report.dataset,
            kind = %report.kind,
            severity = report.severity,
            "Bronze load aborted"
        );
    }

    fn run_cancelled(&self, summary: &RunSummary) {
        warn!(
            run_id = %summary.run_id,
            datasets_loaded = summary.records.len(),
            "Bronze load cancelled"
        );
    }
}

/// Forwards every event to each observer in order
#[derive(Default)]
pub struct Observers {
    observers: Vec<Box<dyn LoadObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl LoadObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn push(&mut self, observer: Box<dyn LoadObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl LoadObserver for Observers {
    fn run_started(&self, run_id: &str, datasets: usize) {
        for o in &self.observers {
            o.run_started(run_id, datasets);
        }
    }

    fn group_started(&self, group: &str, datasets: usize) {
        for o in &self.observers {
            o.group_started(group, datasets);
        }
    }

    fn dataset_started(&self, definition: &DatasetDefinition) {
        for o in &self.observers {
            o.dataset_started(definition);
        }
    }

    fn dataset_cleared(&self, definition: &DatasetDefinition, rows_cleared: u64) {
        for o in &self.observers {
            o.dataset_cleared(definition, rows_cleared);
        }
    }

    fn dataset_loaded(&self, record: &LoadRecord) {
        for o in &self.observers {
            o.dataset_loaded(record);
        }
    }

    fn dataset_failed(&self, record: &LoadRecord, error: &LoadError) {
        for o in &self.observers {
            o.dataset_failed(record, error);
        }
    }

    fn run_completed(&self, summary: &RunSummary) {
        for o in &self.observers {
            o.run_completed(summary);
        }
    }

    fn run_aborted(&self, report: &FailureReport) {
        for o in &self.observers {
            o.run_aborted(report);
        }
    }

    fn run_cancelled(&self, summary: &RunSummary) {
        for o in &self.observers {
            o.run_cancelled(summary);
        }
    }
}
