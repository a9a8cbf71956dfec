//! Reading raw delimited records from a dataset source

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::error::{LoadError, SourceLocation};
use crate::registry::{
    DatasetDefinition, FieldSpec, FieldType, RecordFormat, RecordTerminator, SinkSchema,
    SourceLocator,
};

/// Opens the byte stream behind a source locator
pub trait SourceOpener: Send {
    /// Open the source for reading
    fn open(&self, locator: &SourceLocator) -> Result<Box<dyn Read + Send>, LoadError>;
}

/// Opens sources from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl SourceOpener for FileSource {
    fn open(&self, locator: &SourceLocator) -> Result<Box<dyn Read + Send>, LoadError> {
        let path = locator.path();
        let metadata = std::fs::metadata(path).map_err(|e| LoadError::source_io(path, &e))?;
        if !metadata.is_file() {
            return Err(LoadError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }
        let file = File::open(path).map_err(|e| LoadError::source_io(path, &e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// One field value after coercion to its sink type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Empty raw field
    Null,
    Integer(i32),
    Text(String),
    Date(NaiveDate),
}

/// A coerced record, one value per sink field
pub type Row = Vec<FieldValue>;

/// Coerce one raw field to the declared sink type
pub fn coerce_field(raw: &str, field: &FieldSpec) -> Result<FieldValue, String> {
    if raw.is_empty() {
        return Ok(FieldValue::Null);
    }

    match field.ty {
        FieldType::Integer => raw.trim().parse::<i32>().map(FieldValue::Integer).map_err(|e| {
            format!("invalid integer '{}' for field {}: {}", raw, field.name, e)
        }),
        FieldType::Text { max_len } => {
            let len = raw.chars().count();
            if len > max_len {
                Err(format!(
                    "value for field {} is {} characters, exceeds limit of {}",
                    field.name, len, max_len
                ))
            } else {
                Ok(FieldValue::Text(raw.to_string()))
            }
        }
        FieldType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|e| format!("invalid date '{}' for field {}: {}", raw, field.name, e)),
    }
}

/// Streams coerced rows out of a delimited source
pub struct RecordReader<'a, R: Read> {
    inner: csv::Reader<R>,
    record: csv::ByteRecord,
    path: PathBuf,
    schema: &'a SinkSchema,
    headers_remaining: usize,
    records_read: u64,
    /// Records end at `\n`; a `\r` before it belongs to the terminator
    strip_cr: bool,
}

impl<'a, R: Read> RecordReader<'a, R> {
    /// Wrap a reader using the dataset's format descriptor and sink schema
    pub fn new(reader: R, definition: &'a DatasetDefinition) -> Self {
        Self::with_format(
            reader,
            definition.source().path(),
            definition.format(),
            definition.schema(),
        )
    }

    pub fn with_format(
        reader: R,
        path: &Path,
        format: &RecordFormat,
        schema: &'a SinkSchema,
    ) -> Self {
        let terminator = match format.terminator {
            RecordTerminator::Newline => csv::Terminator::Any(b'\n'),
            RecordTerminator::Byte(b) => csv::Terminator::Any(b),
        };

        let inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(format.delimiter_byte())
            .terminator(terminator)
            .quoting(format.quoted)
            .from_reader(reader);

        Self {
            inner,
            record: csv::ByteRecord::new(),
            path: path.to_path_buf(),
            schema,
            headers_remaining: format.header_rows,
            records_read: 0,
            strip_cr: format.terminator == RecordTerminator::Newline,
        }
    }

    /// Number of data records returned so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next data record, `None` at end of source
    pub fn next_row(&mut self) -> Result<Option<Row>, LoadError> {
        while self.headers_remaining > 0 {
            if !self.read_raw()? {
                return Ok(None);
            }
            self.headers_remaining -= 1;
        }

        if !self.read_raw()? {
            return Ok(None);
        }

        let location = self.current_location();
        let expected = self.schema.len();
        if self.record.len() != expected {
            return Err(LoadError::malformed(
                location,
                format!(
                    "expected {} fields, found {}",
                    expected,
                    self.record.len()
                ),
            ));
        }

        let mut row = Vec::with_capacity(expected);
        for (i, (raw, field)) in self.record.iter().zip(self.schema.fields()).enumerate() {
            let raw = if self.strip_cr && i + 1 == expected {
                raw.strip_suffix(b"\r").unwrap_or(raw)
            } else {
                raw
            };
            let text = std::str::from_utf8(raw).map_err(|e| {
                LoadError::malformed(
                    location.clone(),
                    format!("field {} is not valid UTF-8: {}", field.name, e),
                )
            })?;
            let value = coerce_field(text, field)
                .map_err(|reason| LoadError::malformed(location.clone(), reason))?;
            row.push(value);
        }

        self.records_read += 1;
        Ok(Some(row))
    }

    fn read_raw(&mut self) -> Result<bool, LoadError> {
        loop {
            let more = self
                .inner
                .read_byte_record(&mut self.record)
                .map_err(|e| self.classify_csv_error(e))?;
            // A CRLF blank line is skipped like a bare empty line
            if !more || !self.is_blank_crlf() {
                return Ok(more);
            }
        }
    }

    fn is_blank_crlf(&self) -> bool {
        self.strip_cr && self.record.len() == 1 && self.record.get(0) == Some(&b"\r"[..])
    }

    fn current_location(&self) -> SourceLocation {
        let mut location = SourceLocation::new(&self.path).with_record(self.records_read);
        if let Some(position) = self.record.position() {
            location = location.with_line(position.line());
        }
        location
    }

    fn classify_csv_error(&self, err: csv::Error) -> LoadError {
        let line = err.position().map(|p| p.line());
        self.classify_csv_kind(err.into_kind(), line)
    }

    fn classify_csv_kind(&self, kind: csv::ErrorKind, line: Option<u64>) -> LoadError {
        match kind {
            csv::ErrorKind::Io(io_err) => LoadError::source_io(&self.path, &io_err),
            csv::ErrorKind::Utf8 { .. } | csv::ErrorKind::UnequalLengths { .. } => {
                let mut location = SourceLocation::new(&self.path).with_record(self.records_read);
                if let Some(line) = line {
                    location = location.with_line(line);
                }
                LoadError::malformed(location, format!("{:?}", kind))
            }
            other => LoadError::Unknown(format!(
                "reading {} failed: {:?}",
                self.path.display(),
                other
            )),
        }
    }
}
