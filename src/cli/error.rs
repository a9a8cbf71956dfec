//! CLI error type

use std::path::PathBuf;

use thiserror::Error;

use crate::error::BronzeError;

/// Errors surfaced to the command line
#[derive(Error, Debug)]
pub enum CliError {
    /// Library failure, including a failed load
    #[error(transparent)]
    Bronze(#[from] BronzeError),

    /// Config file not found
    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Output could not be rendered
    #[error("Output error: {0}")]
    Output(String),
}

impl CliError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            CliError::Bronze(e) => e.user_message(),
            CliError::ConfigNotFound(path) => format!(
                "Config file not found: {}\n\n\
                Hint: Pass --config <file> or run from a directory containing config/bronze.toml.",
                path.display()
            ),
            CliError::Output(_) => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
