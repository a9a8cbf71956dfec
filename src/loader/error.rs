//! Classified errors raised while loading a dataset

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::SinkId;

/// Failure taxonomy for a dataset load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Source locator cannot be opened or read
    SourceUnavailable,
    /// A record cannot be parsed or coerced to the sink's field types
    MalformedRecord,
    /// Clear, write or commit against the sink failed
    SinkUnavailable,
    /// Insufficient rights on source or sink
    PermissionDenied,
    /// Anything not classified above
    UnknownFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SourceUnavailable => "source_unavailable",
            ErrorKind::MalformedRecord => "malformed_record",
            ErrorKind::SinkUnavailable => "sink_unavailable",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::UnknownFailure => "unknown_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approximate position of a failure inside a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// Source file
    pub path: PathBuf,
    /// 1-based line where the offending record starts
    pub line: Option<u64>,
    /// 0-based data record index (header rows excluded)
    pub record: Option<u64>,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: None,
            record: None,
        }
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_record(mut self, record: u64) -> Self {
        self.record = Some(record);
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        Ok(())
    }
}

/// Errors that can occur while loading one dataset
#[derive(Error, Debug)]
pub enum LoadError {
    /// Source could not be opened or read
    #[error("Source not accessible: {} - {reason}", .path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A record did not match the format descriptor or sink types
    #[error("Malformed record at {location}: {reason}")]
    MalformedRecord {
        location: SourceLocation,
        reason: String,
    },

    /// Sink missing, mis-shaped, or a statement against it failed
    #[error("Sink {sink} unavailable: {reason}")]
    SinkUnavailable { sink: String, reason: String },

    /// Insufficient rights on source or sink
    #[error("Permission denied on {target}: {reason}")]
    PermissionDenied { target: String, reason: String },

    /// Unclassified failure
    #[error("Unexpected failure: {0}")]
    Unknown(String),
}

impl LoadError {
    /// Classify an IO error raised while opening or reading a source
    pub fn source_io(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => LoadError::PermissionDenied {
                target: path.display().to_string(),
                reason: err.to_string(),
            },
            _ => LoadError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }

    /// A record that could not be parsed
    pub fn malformed(location: SourceLocation, reason: impl Into<String>) -> Self {
        LoadError::MalformedRecord {
            location,
            reason: reason.into(),
        }
    }

    /// Classify a failure reported by the sink's storage engine
    pub fn sink_failure(sink: &SinkId, err: impl fmt::Display) -> Self {
        let reason = err.to_string();
        let lowered = reason.to_lowercase();
        if lowered.contains("read-only")
            || lowered.contains("read only")
            || lowered.contains("permission denied")
        {
            LoadError::PermissionDenied {
                target: sink.to_string(),
                reason,
            }
        } else {
            LoadError::SinkUnavailable {
                sink: sink.to_string(),
                reason,
            }
        }
    }

    /// Sink is missing or has an unexpected shape
    pub fn sink_unavailable(sink: &SinkId, reason: impl Into<String>) -> Self {
        LoadError::SinkUnavailable {
            sink: sink.to_string(),
            reason: reason.into(),
        }
    }

    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            LoadError::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            LoadError::SinkUnavailable { .. } => ErrorKind::SinkUnavailable,
            LoadError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            LoadError::Unknown(_) => ErrorKind::UnknownFailure,
        }
    }

    /// Location inside the source, when the failure carries one
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            LoadError::MalformedRecord { location, .. } => Some(location.clone()),
            LoadError::SourceUnavailable { path, .. } => Some(SourceLocation::new(path)),
            _ => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            LoadError::SourceUnavailable { path, reason } => {
                format!(
                    "Cannot read source: {}\nReason: {reason}\n\n\
                    Hint: Check that the extract exists and the configured base directory is correct.",
                    path.display()
                )
            }
            LoadError::MalformedRecord { location, reason } => {
                format!(
                    "Malformed record at {location}:\n{reason}\n\n\
                    Hint: Check the delimiter, header rows and field types configured for this dataset."
                )
            }
            LoadError::SinkUnavailable { sink, reason } => {
                format!(
                    "Sink {sink} unavailable: {reason}\n\n\
                    Hint: Run 'bronze-ingest init' to provision the raw-layer tables."
                )
            }
            LoadError::PermissionDenied { target, reason } => {
                format!(
                    "Permission denied on {target}: {reason}\n\n\
                    Hint: Check file permissions and that the warehouse is not opened read-only."
                )
            }
            LoadError::Unknown(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_io_classification() {
        let path = Path::new("/data/cust_info.csv");

        let err = LoadError::source_io(
            path,
            &io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert_eq!(err.location().unwrap().path, path);

        let err = LoadError::source_io(
            path,
            &io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        );
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_sink_failure_classification() {
        let sink = SinkId::parse("bronze.crm_cust_info").unwrap();

        let err = LoadError::sink_failure(
            &sink,
            "Cannot execute statement of type \"DELETE\" on database which is attached in read-only mode!",
        );
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let err = LoadError::sink_failure(&sink, "Catalog Error: Table does not exist");
        assert_eq!(err.kind(), ErrorKind::SinkUnavailable);
        assert!(err.to_string().contains("bronze.crm_cust_info"));
    }

    #[test]
    fn test_malformed_location_display() {
        let location = SourceLocation::new("/data/sales.csv")
            .with_line(12)
            .with_record(10);
        let err = LoadError::malformed(location, "invalid integer 'abc' for field sls_cust_id");
        assert_eq!(err.kind(), ErrorKind::MalformedRecord);
        assert!(err.to_string().contains("/data/sales.csv:12"));
        assert_eq!(err.location().unwrap().line, Some(12));
    }

    #[test]
    fn test_user_message_hints() {
        let sink = SinkId::parse("bronze.erp_loc_a101").unwrap();
        let msg = LoadError::sink_unavailable(&sink, "table does not exist").user_message();
        assert!(msg.contains("bronze.erp_loc_a101"));
        assert!(msg.contains("Hint:"));
    }
}
