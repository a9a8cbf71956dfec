//! Raw-layer sink abstraction

use std::collections::HashMap;

use super::error::LoadError;
use super::source::Row;
use crate::registry::{SinkId, SinkSchema};

/// Destination table of a dataset load
///
/// The loader clears a sink outside any transaction, then writes all rows
/// between `begin` and `commit`. A failed load calls `rollback`, which must
/// leave the sink in its cleared state.
pub trait RawSink {
    /// Number of columns of the sink, `None` when it does not exist
    fn column_count(&mut self, sink: &SinkId) -> Result<Option<usize>, LoadError>;

    /// Remove all rows and make the removal durable; returns rows removed
    fn clear(&mut self, sink: &SinkId) -> Result<u64, LoadError>;

    /// Open the write transaction for a sink
    fn begin(&mut self, sink: &SinkId) -> Result<(), LoadError>;

    /// Append rows inside the open transaction; returns rows written
    fn insert_batch(
        &mut self,
        sink: &SinkId,
        schema: &SinkSchema,
        rows: &[Row],
    ) -> Result<u64, LoadError>;

    fn commit(&mut self, sink: &SinkId) -> Result<(), LoadError>;

    fn rollback(&mut self, sink: &SinkId) -> Result<(), LoadError>;

    /// Current number of rows in the sink
    fn row_count(&mut self, sink: &SinkId) -> Result<u64, LoadError>;
}

#[derive(Debug, Default)]
struct MemoryTable {
    columns: usize,
    rows: Vec<Row>,
}

/// In-memory sink, used for dry runs and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: HashMap<SinkId, MemoryTable>,
    pending: Option<(SinkId, Vec<Row>)>,
    read_only: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write with a permission error
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Create an empty sink table
    pub fn define(&mut self, sink: SinkId, columns: usize) {
        self.tables.insert(
            sink,
            MemoryTable {
                columns,
                rows: Vec::new(),
            },
        );
    }

    /// Create empty sink tables matching a schema
    pub fn define_schema(&mut self, sink: &SinkId, schema: &SinkSchema) {
        self.define(sink.clone(), schema.len());
    }

    /// Committed rows of a sink
    pub fn rows(&self, sink: &SinkId) -> Option<&[Row]> {
        self.tables.get(sink).map(|t| t.rows.as_slice())
    }

    fn table_mut(&mut self, sink: &SinkId) -> Result<&mut MemoryTable, LoadError> {
        self.tables
            .get_mut(sink)
            .ok_or_else(|| LoadError::sink_unavailable(sink, "sink does not exist"))
    }

    fn check_writable(&self, sink: &SinkId) -> Result<(), LoadError> {
        if self.read_only {
            return Err(LoadError::sink_failure(sink, "sink is read-only"));
        }
        Ok(())
    }
}

impl RawSink for MemorySink {
    fn column_count(&mut self, sink: &SinkId) -> Result<Option<usize>, LoadError> {
        Ok(self.tables.get(sink).map(|t| t.columns))
    }

    fn clear(&mut self, sink: &SinkId) -> Result<u64, LoadError> {
        self.check_writable(sink)?;
        let table = self.table_mut(sink)?;
        let removed = table.rows.len() as u64;
        table.rows.clear();
        Ok(removed)
    }

    fn begin(&mut self, sink: &SinkId) -> Result<(), LoadError> {
        self.check_writable(sink)?;
        if self.pending.is_some() {
            return Err(LoadError::sink_unavailable(
                sink,
                "a transaction is already open",
            ));
        }
        self.table_mut(sink)?;
        self.pending = Some((sink.clone(), Vec::new()));
        Ok(())
    }

    fn insert_batch(
        &mut self,
        sink: &SinkId,
        schema: &SinkSchema,
        rows: &[Row],
    ) -> Result<u64, LoadError> {
        let columns = self.table_mut(sink)?.columns;
        if columns != schema.len() {
            return Err(LoadError::sink_unavailable(
                sink,
                format!("sink has {} columns, rows have {}", columns, schema.len()),
            ));
        }
        match self.pending.as_mut() {
            Some((open, staged)) if *open == *sink => {
                staged.extend(rows.iter().cloned());
                Ok(rows.len() as u64)
            }
            _ => Err(LoadError::sink_unavailable(sink, "no open transaction")),
        }
    }

    fn commit(&mut self, sink: &SinkId) -> Result<(), LoadError> {
        match self.pending.take() {
            Some((open, staged)) if &open == sink => {
                self.table_mut(sink)?.rows.extend(staged);
                Ok(())
            }
            _ => Err(LoadError::sink_unavailable(sink, "no open transaction")),
        }
    }

    fn rollback(&mut self, _sink: &SinkId) -> Result<(), LoadError> {
        self.pending = None;
        Ok(())
    }

    fn row_count(&mut self, sink: &SinkId) -> Result<u64, LoadError> {
        Ok(self.table_mut(sink)?.rows.len() as u64)
    }
}
