//! Raw loader
//!
//! Copies one dataset's source into its sink: the sink is cleared, then every
//! record is coerced to the sink's field types and inserted inside a single
//! transaction. A failed load rolls the transaction back and leaves the sink
//! empty.

mod error;
mod raw;
mod record;
mod sink;
mod source;
#[cfg(feature = "duckdb-backend")]
mod warehouse;

pub use error::{ErrorKind, LoadError, SourceLocation};
pub use raw::{DEFAULT_BATCH_SIZE, DatasetLoader, LoadOutcome, RawLoader};
pub use record::{LoadRecord, LoadStatus, format_duration};
pub use sink::{MemorySink, RawSink};
pub use source::{FieldValue, FileSource, RecordReader, Row, SourceOpener, coerce_field};
#[cfg(feature = "duckdb-backend")]
pub use warehouse::DuckDbSink;
