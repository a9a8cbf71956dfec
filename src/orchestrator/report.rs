//! Enriched failure reporting

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use super::summary::RunSummary;
use crate::loader::{ErrorKind, LoadError, SourceLocation};

/// Severity for bad source data or configuration
pub const SEVERITY_USER: u8 = 16;
/// Severity for unavailable storage
pub const SEVERITY_RESOURCE: u8 = 17;
/// Severity for permission failures
pub const SEVERITY_PERMISSION: u8 = 14;

/// Numeric severity for an error kind, in the style of a database engine error
pub fn severity(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::SourceUnavailable | ErrorKind::MalformedRecord | ErrorKind::UnknownFailure => {
            SEVERITY_USER
        }
        ErrorKind::SinkUnavailable => SEVERITY_RESOURCE,
        ErrorKind::PermissionDenied => SEVERITY_PERMISSION,
    }
}

/// Diagnostic context attached to the failure that ended a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub dataset: String,
    pub kind: ErrorKind,
    pub severity: u8,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} severity {}] dataset {}: {}",
            self.kind, self.severity, self.dataset, self.message
        )?;
        if let Some(location) = &self.location {
            write!(f, " (at {})", location)?;
        }
        Ok(())
    }
}

/// A run that stopped on its first failed dataset
#[derive(Error, Debug)]
#[error("Bronze load failed on dataset '{}': {}", .report.dataset, .report.message)]
pub struct RunFailure {
    pub report: FailureReport,
    /// Completed datasets followed by the failed one
    pub summary: RunSummary,
    #[source]
    pub source: LoadError,
}

impl RunFailure {
    pub fn kind(&self) -> ErrorKind {
        self.report.kind
    }

    pub fn dataset(&self) -> &str {
        &self.report.dataset
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        format!(
            "Dataset '{}' failed ({}, severity {})\n{}",
            self.report.dataset,
            self.report.kind,
            self.report.severity,
            self.source.user_message()
        )
    }
}

/// Enriches and logs the error that ends a run
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureReporter;

impl FailureReporter {
    /// Build the run failure for `error` raised while loading `dataset`
    pub fn report(&self, error: LoadError, dataset: &str, summary: RunSummary) -> RunFailure {
        let kind = error.kind();
        let report = FailureReport {
            dataset: dataset.to_string(),
            kind,
            severity: severity(kind),
            message: error.to_string(),
            location: error.location(),
        };

        error!(
            run_id = %summary.run_id,
            dataset,
            kind = %kind,
            severity = report.severity,
            location = ?report.location.as_ref().map(|l| l.to_string()),
            error = %report.message,
            "Bronze load failed"
        );

        RunFailure {
            report,
            summary,
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::path::PathBuf;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity(ErrorKind::MalformedRecord), 16);
        assert_eq!(severity(ErrorKind::SourceUnavailable), 16);
        assert_eq!(severity(ErrorKind::SinkUnavailable), 17);
        assert_eq!(severity(ErrorKind::PermissionDenied), 14);
        assert_eq!(severity(ErrorKind::UnknownFailure), 16);
    }

    #[test]
    fn test_report_carries_location() {
        let error = LoadError::malformed(
            SourceLocation::new("/data/sales_details.csv")
                .with_line(42)
                .with_record(40),
            "invalid integer 'x' for field sls_quantity",
        );
        let failure = FailureReporter.report(error, "crm_sales_details", RunSummary::new("run-1"));

        assert_eq!(failure.dataset(), "crm_sales_details");
        assert_eq!(failure.kind(), ErrorKind::MalformedRecord);
        assert_eq!(failure.report.severity, 16);
        let location = failure.report.location.as_ref().unwrap();
        assert_eq!(location.line, Some(42));
        assert!(failure.report.to_string().contains("sales_details.csv:42"));
        assert!(failure.to_string().contains("crm_sales_details"));
        assert!(failure.source().is_some());
    }

    #[test]
    fn test_user_message_includes_hint() {
        let error = LoadError::SourceUnavailable {
            path: PathBuf::from("/data/LOC_A101.csv"),
            reason: "No such file or directory".to_string(),
        };
        let failure = FailureReporter.report(error, "erp_loc_a101", RunSummary::new("run-2"));
        let msg = failure.user_message();
        assert!(msg.contains("erp_loc_a101"));
        assert!(msg.contains("severity 16"));
        assert!(msg.contains("Hint:"));
    }
}
