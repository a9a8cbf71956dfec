//! Sequential, fail-fast load orchestration

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span};
use uuid::Uuid;

use super::observer::{LoadObserver, TracingObserver};
use super::report::{FailureReporter, RunFailure};
use super::summary::{RunStatus, RunSummary};
use crate::loader::{DatasetLoader, LoadOutcome};
use crate::registry::DatasetRegistry;

/// Runs every dataset of a registry through a loader, stopping at the first failure
pub struct LoadOrchestrator<L: DatasetLoader> {
    registry: DatasetRegistry,
    loader: L,
    observer: Box<dyn LoadObserver>,
    reporter: FailureReporter,
    cancel: Option<Arc<AtomicBool>>,
}

impl<L: DatasetLoader> LoadOrchestrator<L> {
    /// Create an orchestrator that narrates through `tracing`
    pub fn new(registry: DatasetRegistry, loader: L) -> Self {
        Self {
            registry,
            loader,
            observer: Box::new(TracingObserver),
            reporter: FailureReporter,
            cancel: None,
        }
    }

    /// Replace the lifecycle observer
    pub fn with_observer(mut self, observer: impl LoadObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Stop before the next dataset once `flag` is raised
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn into_loader(self) -> L {
        self.loader
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Load every dataset in registry order
    pub fn run(&mut self) -> Result<RunSummary, RunFailure> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!("bronze_run", run_id = %run_id).entered();

        let mut summary = RunSummary::new(&run_id);
        let mut window = LoadWindow::default();
        self.observer.run_started(&run_id, self.registry.len());

        for group in self.registry.groups() {
            self.observer.group_started(group.name(), group.len());

            for definition in group.datasets() {
                if self.is_cancelled() {
                    debug!(next = definition.name(), "Cancellation requested");
                    summary.finish(RunStatus::Cancelled, window.elapsed());
                    self.observer.run_cancelled(&summary);
                    return Ok(summary);
                }

                let _dataset_span = info_span!(
                    "bronze_dataset",
                    group = group.name(),
                    dataset = definition.name()
                )
                .entered();
                self.observer.dataset_started(definition);

                window.begin();
                let outcome = self.loader.load(definition, self.observer.as_ref());
                window.end();

                match outcome {
                    LoadOutcome::Success(record) => {
                        self.observer.dataset_loaded(&record);
                        summary.push(record);
                    }
                    LoadOutcome::Failure { record, error } => {
                        self.observer.dataset_failed(&record, &error);
                        summary.push(record);
                        summary.finish(RunStatus::Failed, window.elapsed());

                        let failure = self.reporter.report(error, definition.name(), summary);
                        self.observer.run_aborted(&failure.report);
                        return Err(failure);
                    }
                }
            }
        }

        summary.finish(RunStatus::Completed, window.elapsed());
        info!(
            run_id = %run_id,
            datasets = summary.records.len(),
            "All datasets loaded"
        );
        self.observer.run_completed(&summary);
        Ok(summary)
    }

    /// Raise the cancellation flag, if one is attached
    pub fn cancel(&self) {
        if let Some(flag) = &self.cancel {
            flag.store(true, Ordering::SeqCst);
        }
        debug!(cancelled = self.is_cancelled(), "Cancel requested");
    }
}

/// Monotonic span from the first dataset's start to the last dataset's end
#[derive(Debug, Default)]
struct LoadWindow {
    first_start: Option<Instant>,
    last_end: Option<Instant>,
}

impl LoadWindow {
    fn begin(&mut self) {
        self.first_start.get_or_insert_with(Instant::now);
    }

    fn end(&mut self) {
        self.last_end = Some(Instant::now());
    }

    fn elapsed(&self) -> Duration {
        match (self.first_start, self.last_end) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }
}
