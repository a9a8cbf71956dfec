//! CLI command handlers

pub mod datasets;
pub mod init;
pub mod run;

use std::path::Path;

use super::error::CliError;
use crate::config::BronzeConfig;

/// Read the config file named on the command line
pub fn load_config(path: &Path) -> Result<BronzeConfig, CliError> {
    if !path.exists() {
        return Err(CliError::ConfigNotFound(path.to_path_buf()));
    }
    BronzeConfig::load(path).map_err(|e| CliError::Bronze(e.into()))
}
