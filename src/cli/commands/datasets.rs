//! `datasets` command: list the registry

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::cli::output::format_registry;

/// Arguments for the `datasets` command
pub struct DatasetsArgs {
    /// Configuration file
    pub config: PathBuf,
}

/// Handle the `datasets` command
pub fn handle_datasets(args: &DatasetsArgs) -> Result<(), CliError> {
    let config = super::load_config(&args.config)?;
    let registry = config
        .to_registry()
        .map_err(|e| CliError::Bronze(e.into()))?;

    print!("{}", format_registry(&registry));
    println!("{} datasets", registry.len());
    Ok(())
}
