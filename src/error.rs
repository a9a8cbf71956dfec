//! Top-level error type for library entry points

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::orchestrator::RunFailure;
use crate::provision::ProvisionError;

/// Errors returned by the library entry points
#[derive(Error, Debug)]
pub enum BronzeError {
    /// Configuration could not be read or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Warehouse database could not be opened
    #[error("Failed to open warehouse {}: {reason}", .path.display())]
    Warehouse { path: PathBuf, reason: String },

    /// Sink provisioning failed
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// The load stopped on a failed dataset
    #[error(transparent)]
    Run(Box<RunFailure>),
}

impl From<RunFailure> for BronzeError {
    fn from(failure: RunFailure) -> Self {
        BronzeError::Run(Box::new(failure))
    }
}

impl BronzeError {
    /// The run failure, when the load itself failed
    pub fn run_failure(&self) -> Option<&RunFailure> {
        match self {
            BronzeError::Run(failure) => Some(failure.as_ref()),
            _ => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            BronzeError::Run(failure) => failure.user_message(),
            BronzeError::Warehouse { path, reason } => format!(
                "Cannot open warehouse {}: {reason}\n\n\
                Hint: Check the [warehouse] database path in the config file.",
                path.display()
            ),
            other => other.to_string(),
        }
    }
}
