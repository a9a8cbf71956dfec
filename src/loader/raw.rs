//! Clear-then-load of a single dataset

use std::io::Read;
use std::time::Instant;

use tracing::{debug, warn};

use super::error::LoadError;
use super::record::LoadRecord;
use super::sink::RawSink;
use super::source::{FileSource, RecordReader, Row, SourceOpener};
use crate::orchestrator::LoadObserver;
use crate::registry::DatasetDefinition;

/// Rows buffered before each sink insert
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Result of one dataset load
#[derive(Debug)]
pub enum LoadOutcome {
    Success(LoadRecord),
    /// The sink was left cleared
    Failure { record: LoadRecord, error: LoadError },
}

impl LoadOutcome {
    pub fn record(&self) -> &LoadRecord {
        match self {
            LoadOutcome::Success(record) => record,
            LoadOutcome::Failure { record, .. } => record,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoadOutcome::Success(_))
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            LoadOutcome::Success(_) => None,
            LoadOutcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Loads one dataset into its sink
pub trait DatasetLoader {
    fn load(&mut self, definition: &DatasetDefinition, observer: &dyn LoadObserver)
    -> LoadOutcome;
}

/// Streams a dataset's raw records into its sink
pub struct RawLoader<S: RawSink> {
    sink: S,
    opener: Box<dyn SourceOpener>,
    batch_size: usize,
}

impl<S: RawSink> RawLoader<S> {
    /// Create a loader reading sources from the filesystem
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            opener: Box::new(FileSource),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Replace how sources are opened
    pub fn with_source_opener(mut self, opener: impl SourceOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Clear-then-load one dataset. A missing or mis-shaped sink fails before
    /// the clear and keeps its rows.
    fn copy(
        &mut self,
        definition: &DatasetDefinition,
        record: &mut LoadRecord,
        observer: &dyn LoadObserver,
    ) -> Result<u64, LoadError> {
        let sink = definition.sink();
        let expected = definition.schema().len();

        match self.sink.column_count(sink)? {
            None => return Err(LoadError::sink_unavailable(sink, "sink does not exist")),
            Some(found) if found != expected => {
                return Err(LoadError::sink_unavailable(
                    sink,
                    format!(
                        "sink has {} columns but dataset declares {}",
                        found, expected
                    ),
                ));
            }
            Some(_) => {}
        }

        let cleared = self.sink.clear(sink)?;
        record.rows_cleared = cleared;
        observer.dataset_cleared(definition, cleared);

        let source = self.opener.open(definition.source())?;
        let mut reader = RecordReader::new(source, definition);

        self.sink.begin(sink)?;
        let written = self
            .stream(definition, &mut reader)
            .and_then(|rows| self.sink.commit(sink).map(|_| rows));

        if written.is_err()
            && let Err(e) = self.sink.rollback(sink)
        {
            warn!(dataset = definition.name(), error = %e, "Rollback failed");
        }
        written
    }

    fn stream<R: Read>(
        &mut self,
        definition: &DatasetDefinition,
        reader: &mut RecordReader<'_, R>,
    ) -> Result<u64, LoadError> {
        let sink = definition.sink();
        let schema = definition.schema();
        let mut batch: Vec<Row> = Vec::with_capacity(self.batch_size);
        let mut written = 0u64;

        while let Some(row) = reader.next_row()? {
            batch.push(row);
            if batch.len() >= self.batch_size {
                written += self.sink.insert_batch(sink, schema, &batch)?;
                debug!(dataset = definition.name(), rows = written, "Inserted batch");
                batch.clear();
            }
        }
        if !batch.is_empty() {
            written += self.sink.insert_batch(sink, schema, &batch)?;
        }
        Ok(written)
    }
}

impl<S: RawSink> DatasetLoader for RawLoader<S> {
    fn load(
        &mut self,
        definition: &DatasetDefinition,
        observer: &dyn LoadObserver,
    ) -> LoadOutcome {
        let mut record = LoadRecord::start(definition.name(), definition.sink().to_string());
        let started = Instant::now();

        match self.copy(definition, &mut record, observer) {
            Ok(rows) => {
                record.succeed(rows, started.elapsed());
                LoadOutcome::Success(record)
            }
            Err(error) => {
                record.fail(&error, started.elapsed());
                LoadOutcome::Failure { record, error }
            }
        }
    }
}
