//! Load orchestration
//!
//! Sequences the raw loader across every dataset of the registry, one at a
//! time and in registry order. The first failure stops the run and is handed
//! to the [`FailureReporter`], which enriches it into a [`RunFailure`].

mod executor;
mod observer;
#[cfg(feature = "progress")]
mod progress;
mod report;
mod summary;

pub use executor::LoadOrchestrator;
pub use observer::{LoadObserver, NoopObserver, Observers, TracingObserver};
#[cfg(feature = "progress")]
pub use progress::{ProgressObserver, format_number};
pub use report::{
    FailureReport, FailureReporter, RunFailure, SEVERITY_PERMISSION, SEVERITY_RESOURCE,
    SEVERITY_USER, severity,
};
pub use summary::{RunStatus, RunSummary};
