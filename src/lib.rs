//! Bronze-layer batch loading for a data warehouse
//!
//! Provides:
//! - A fixed, ordered registry of raw datasets grouped by source system
//! - A raw loader that clears a sink and bulk-copies a delimited source into it
//! - A fail-fast orchestrator that loads every dataset in order and times each load
//! - Enriched failure reports carrying error kind, severity and source location
//!
//! ```no_run
//! use bronze_ingest::{BronzeConfig, run_bronze_load};
//!
//! let config = BronzeConfig::load("config/bronze.toml")?;
//! let summary = run_bronze_load(&config)?;
//! summary.print_summary();
//! # Ok::<(), bronze_ingest::BronzeError>(())
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod provision;
pub mod registry;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "duckdb-backend")]
use std::sync::Arc;
#[cfg(feature = "duckdb-backend")]
use std::sync::atomic::AtomicBool;

pub use config::{BronzeConfig, ConfigError, DatasetConfig, GroupConfig, WarehouseConfig};
pub use error::BronzeError;
#[cfg(feature = "duckdb-backend")]
pub use loader::DuckDbSink;
pub use loader::{
    DatasetLoader, ErrorKind, LoadError, LoadOutcome, LoadRecord, LoadStatus, MemorySink,
    RawLoader, RawSink,
};
#[cfg(feature = "progress")]
pub use orchestrator::ProgressObserver;
pub use orchestrator::{
    FailureReport, FailureReporter, LoadObserver, LoadOrchestrator, NoopObserver, Observers,
    RunFailure, RunStatus, RunSummary, TracingObserver,
};
pub use provision::{ProvisionError, ProvisionMode, ProvisionReport};
pub use registry::{
    DatasetDefinition, DatasetRegistry, FieldSpec, FieldType, RecordFormat, RecordTerminator,
    RegistryError, SinkId, SinkSchema, SourceGroup, SourceLocator,
};

/// Open the configured warehouse database
#[cfg(feature = "duckdb-backend")]
pub fn open_warehouse(config: &BronzeConfig) -> Result<DuckDbSink, BronzeError> {
    let path = &config.warehouse.database;
    DuckDbSink::open(&path.to_string_lossy()).map_err(|e| BronzeError::Warehouse {
        path: path.clone(),
        reason: e.to_string(),
    })
}

/// Load every configured dataset into the warehouse, narrating through `tracing`
#[cfg(feature = "duckdb-backend")]
pub fn run_bronze_load(config: &BronzeConfig) -> Result<RunSummary, BronzeError> {
    run_bronze_load_with(config, TracingObserver, None)
}

/// Load every configured dataset with a custom observer and cancellation flag
#[cfg(feature = "duckdb-backend")]
pub fn run_bronze_load_with(
    config: &BronzeConfig,
    observer: impl LoadObserver + 'static,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<RunSummary, BronzeError> {
    let registry = config.to_registry()?;
    let warehouse = open_warehouse(config)?;

    let mut orchestrator =
        LoadOrchestrator::new(registry, RawLoader::new(warehouse)).with_observer(observer);
    if let Some(flag) = cancel {
        orchestrator = orchestrator.with_cancellation(flag);
    }
    Ok(orchestrator.run()?)
}

/// Create the warehouse schemas and sink tables for every configured dataset
#[cfg(feature = "duckdb-backend")]
pub fn provision_warehouse(
    config: &BronzeConfig,
    mode: ProvisionMode,
) -> Result<ProvisionReport, BronzeError> {
    let registry = config.to_registry()?;
    let warehouse = open_warehouse(config)?;
    Ok(provision::provision(&warehouse, &registry, mode)?)
}
