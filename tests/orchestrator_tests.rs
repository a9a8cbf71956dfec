//! Integration tests for the load orchestrator over an in-memory sink
//!
//! Covers ordering, fail-fast behavior, timing and cancellation using the
//! shipped six-dataset catalog.

mod common;

use std::fs;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bronze_ingest::loader::{FileSource, SourceOpener};
use bronze_ingest::{
    DatasetDefinition, DatasetLoader, ErrorKind, LoadError, LoadObserver, LoadOrchestrator,
    LoadOutcome, LoadRecord, NoopObserver, RunStatus, SourceLocator,
};

/// Records every dataset handed to the wrapped loader
struct CountingLoader<L> {
    inner: L,
    calls: Vec<String>,
}

impl<L> CountingLoader<L> {
    fn new(inner: L) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }
}

impl<L: DatasetLoader> DatasetLoader for CountingLoader<L> {
    fn load(&mut self, definition: &DatasetDefinition, observer: &dyn LoadObserver) -> LoadOutcome {
        self.calls.push(definition.name().to_string());
        self.inner.load(definition, observer)
    }
}

/// Opens files after a fixed delay
struct SlowSource(Duration);

impl SourceOpener for SlowSource {
    fn open(&self, locator: &SourceLocator) -> Result<Box<dyn Read + Send>, LoadError> {
        thread::sleep(self.0);
        FileSource.open(locator)
    }
}

/// Logs per-dataset lifecycle events
#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl LoadObserver for EventLog {
    fn dataset_started(&self, definition: &DatasetDefinition) {
        self.0
            .lock()
            .unwrap()
            .push(format!("started:{}", definition.name()));
    }

    fn dataset_cleared(&self, definition: &DatasetDefinition, rows: u64) {
        self.0
            .lock()
            .unwrap()
            .push(format!("cleared:{}:{}", definition.name(), rows));
    }

    fn dataset_loaded(&self, record: &LoadRecord) {
        self.0
            .lock()
            .unwrap()
            .push(format!("loaded:{}:{}", record.dataset, record.rows_loaded));
    }
}

#[test]
fn test_valid_sources_load_every_record() {
    let (_dir, _config, registry) = common::workspace(25);
    let mut orchestrator = LoadOrchestrator::new(registry.clone(), common::memory_loader(&registry))
        .with_observer(NoopObserver);

    let summary = orchestrator.run().expect("Run failed");

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.records.len(), 6);
    for record in &summary.records {
        assert!(record.is_success());
        assert_eq!(record.rows_loaded, 25);
    }

    let sink = orchestrator.into_loader().into_sink();
    for definition in registry.datasets() {
        assert_eq!(sink.rows(definition.sink()).unwrap().len(), 25);
    }
}

#[test]
fn test_records_follow_registry_order() {
    let (_dir, _config, registry) = common::workspace(3);
    let mut orchestrator = LoadOrchestrator::new(registry.clone(), common::memory_loader(&registry))
        .with_observer(NoopObserver);

    let summary = orchestrator.run().unwrap();
    let order: Vec<&str> = summary.records.iter().map(|r| r.dataset.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "crm_cust_info",
            "crm_prd_info",
            "crm_sales_details",
            "erp_loc_a101",
            "erp_cust_az12",
            "erp_px_cat_g1v2"
        ]
    );
}

#[test]
fn test_consecutive_runs_are_idempotent() {
    let (_dir, _config, registry) = common::workspace(40);
    let mut orchestrator = LoadOrchestrator::new(registry.clone(), common::memory_loader(&registry))
        .with_observer(NoopObserver);

    let first = orchestrator.run().unwrap();
    let second = orchestrator.run().unwrap();

    assert!(first.is_success() && second.is_success());
    assert_ne!(first.run_id, second.run_id);
    for (a, b) in first.records.iter().zip(&second.records) {
        assert_eq!(a.rows_loaded, b.rows_loaded);
        assert_eq!(b.rows_cleared, a.rows_loaded);
    }
}

#[test]
fn test_unreachable_second_source_stops_run() {
    let (_dir, _config, registry) = common::workspace(10);
    let second = registry.get("crm_prd_info").unwrap();
    fs::remove_file(second.source().path()).unwrap();

    let loader = CountingLoader::new(common::memory_loader(&registry));
    let mut orchestrator =
        LoadOrchestrator::new(registry.clone(), loader).with_observer(NoopObserver);

    let failure = orchestrator.run().unwrap_err();

    assert_eq!(failure.dataset(), "crm_prd_info");
    assert_eq!(failure.kind(), ErrorKind::SourceUnavailable);
    assert_eq!(failure.report.severity, 16);
    assert!(failure.to_string().contains("crm_prd_info"));

    let records = &failure.summary.records;
    assert_eq!(records.len(), 2);
    assert!(records[0].is_success());
    assert_eq!(records[1].error_kind, Some(ErrorKind::SourceUnavailable));
    assert_eq!(failure.summary.status, RunStatus::Failed);

    assert_eq!(
        orchestrator.loader().calls,
        vec!["crm_cust_info", "crm_prd_info"]
    );
}

#[test]
fn test_malformed_record_reports_location() {
    let (_dir, _config, registry) = common::workspace(5);
    let sales = registry.get("crm_sales_details").unwrap();
    let mut content = fs::read_to_string(sales.source().path()).unwrap();
    content.push_str("SO1,P1,abc,1,1,1,1,1,1\n");
    fs::write(sales.source().path(), content).unwrap();

    let mut orchestrator = LoadOrchestrator::new(registry.clone(), common::memory_loader(&registry))
        .with_observer(NoopObserver);
    let failure = orchestrator.run().unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::MalformedRecord);
    let location = failure.report.location.clone().unwrap();
    assert_eq!(location.path, sales.source().path());
    assert_eq!(location.line, Some(7));
    assert_eq!(location.record, Some(5));

    let sink = orchestrator.into_loader().into_sink();
    assert!(sink.rows(sales.sink()).unwrap().is_empty());
}

#[test]
fn test_delay_in_source_grows_duration() {
    let (_dir, _config, registry) = common::workspace(10);

    let mut fast = LoadOrchestrator::new(registry.clone(), common::memory_loader(&registry))
        .with_observer(NoopObserver);
    let fast_summary = fast.run().unwrap();

    let delay = Duration::from_millis(150);
    let slow_loader = common::memory_loader(&registry).with_source_opener(SlowSource(delay));
    let mut slow = LoadOrchestrator::new(registry.clone(), slow_loader).with_observer(NoopObserver);
    let slow_summary = slow.run().unwrap();

    for (fast_record, slow_record) in fast_summary.records.iter().zip(&slow_summary.records) {
        assert!(slow_record.duration >= delay);
        assert!(slow_record.duration > fast_record.duration);
    }
    assert!(slow_summary.duration >= slow_summary.max_duration());
    assert!(slow_summary.duration >= delay * 6);
}

#[test]
fn test_cancellation_stops_between_datasets() {
    let (_dir, _config, registry) = common::workspace(5);
    let flag = Arc::new(AtomicBool::new(false));

    struct CancelAfterFirst {
        flag: Arc<AtomicBool>,
    }

    impl LoadObserver for CancelAfterFirst {
        fn dataset_loaded(&self, _record: &LoadRecord) {
            self.flag.store(true, Ordering::SeqCst);
        }
    }

    let loader = CountingLoader::new(common::memory_loader(&registry));
    let mut orchestrator = LoadOrchestrator::new(registry.clone(), loader)
        .with_observer(CancelAfterFirst { flag: flag.clone() })
        .with_cancellation(flag);

    let summary = orchestrator.run().unwrap();
    assert_eq!(summary.status, RunStatus::Cancelled);
    assert_eq!(summary.records.len(), 1);
    assert_eq!(orchestrator.loader().calls, vec!["crm_cust_info"]);
}

#[test]
fn test_each_dataset_is_cleared_before_load() {
    let (_dir, _config, registry) = common::workspace(4);
    let log = EventLog::default();
    let mut orchestrator = LoadOrchestrator::new(registry.clone(), common::memory_loader(&registry))
        .with_observer(log.clone());

    let expected = |cleared: u64| {
        registry
            .datasets()
            .flat_map(|d| {
                vec![
                    format!("started:{}", d.name()),
                    format!("cleared:{}:{}", d.name(), cleared),
                    format!("loaded:{}:4", d.name()),
                ]
            })
            .collect::<Vec<_>>()
    };

    orchestrator.run().unwrap();
    assert_eq!(log.take(), expected(0));

    orchestrator.run().unwrap();
    assert_eq!(log.take(), expected(4));
}

#[test]
fn test_clear_reported_before_failed_load() {
    let (_dir, _config, registry) = common::workspace(4);
    let log = EventLog::default();
    let mut orchestrator = LoadOrchestrator::new(registry.clone(), common::memory_loader(&registry))
        .with_observer(log.clone());
    orchestrator.run().unwrap();
    log.take();

    let first = registry.get("crm_cust_info").unwrap();
    fs::write(first.source().path(), "cst_id\nbroken\n").unwrap();

    let failure = orchestrator.run().unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::MalformedRecord);
    assert_eq!(
        log.take(),
        vec!["started:crm_cust_info", "cleared:crm_cust_info:4"]
    );

    let sink = orchestrator.into_loader().into_sink();
    assert!(sink.rows(first.sink()).unwrap().is_empty());
}
