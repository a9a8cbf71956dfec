//! DuckDB-backed raw-layer sink

use duckdb::types::{ToSql, ToSqlOutput, Value};
use duckdb::{AccessMode, Config, Connection, params_from_iter};
use tracing::debug;

use super::error::LoadError;
use super::sink::RawSink;
use super::source::{FieldValue, Row};
use crate::registry::{SinkId, SinkSchema};

impl ToSql for FieldValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            FieldValue::Null => Value::Null,
            FieldValue::Integer(v) => Value::Int(*v),
            FieldValue::Text(s) => Value::Text(s.clone()),
            // Bound as text and cast in the INSERT statement
            FieldValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Warehouse database holding the raw-layer sink tables
pub struct DuckDbSink {
    conn: Connection,
    path: Option<String>,
}

impl DuckDbSink {
    /// Open or create a warehouse database at the given path
    pub fn open(path: &str) -> Result<Self, duckdb::Error> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an existing warehouse without write access
    pub fn open_read_only(path: &str) -> Result<Self, duckdb::Error> {
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn memory() -> Result<Self, duckdb::Error> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Get the database path (if not in-memory)
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Underlying connection, used by provisioning and queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_sql(sink: &SinkId, schema: &SinkSchema) -> String {
        let values = schema
            .fields()
            .iter()
            .map(|f| format!("CAST(? AS {})", f.ty.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            sink.quoted(),
            schema.column_list(),
            values
        )
    }
}

impl RawSink for DuckDbSink {
    fn column_count(&mut self, sink: &SinkId) -> Result<Option<usize>, LoadError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.columns
                 WHERE table_schema = ?1 AND table_name = ?2",
                [sink.schema(), sink.table()],
                |row| row.get(0),
            )
            .map_err(|e| LoadError::sink_failure(sink, e))?;
        Ok(if count == 0 { None } else { Some(count as usize) })
    }

    fn clear(&mut self, sink: &SinkId) -> Result<u64, LoadError> {
        let removed = self
            .conn
            .execute(&format!("DELETE FROM {}", sink.quoted()), [])
            .map_err(|e| LoadError::sink_failure(sink, e))?;
        debug!(sink = %sink, rows = removed, "Cleared sink");
        Ok(removed as u64)
    }

    fn begin(&mut self, sink: &SinkId) -> Result<(), LoadError> {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| LoadError::sink_failure(sink, e))
    }

    fn insert_batch(
        &mut self,
        sink: &SinkId,
        schema: &SinkSchema,
        rows: &[Row],
    ) -> Result<u64, LoadError> {
        let mut stmt = self
            .conn
            .prepare_cached(&Self::insert_sql(sink, schema))
            .map_err(|e| LoadError::sink_failure(sink, e))?;

        let mut written = 0u64;
        for row in rows {
            written += stmt
                .execute(params_from_iter(row.iter()))
                .map_err(|e| LoadError::sink_failure(sink, e))? as u64;
        }
        Ok(written)
    }

    fn commit(&mut self, sink: &SinkId) -> Result<(), LoadError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| LoadError::sink_failure(sink, e))
    }

    fn rollback(&mut self, sink: &SinkId) -> Result<(), LoadError> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| LoadError::sink_failure(sink, e))
    }

    fn row_count(&mut self, sink: &SinkId) -> Result<u64, LoadError> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", sink.quoted()), [], |row| {
                row.get(0)
            })
            .map_err(|e| LoadError::sink_failure(sink, e))?;
        Ok(count as u64)
    }
}
