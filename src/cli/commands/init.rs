//! `init` command: provision sink tables

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::provision::ProvisionMode;

/// Arguments for the `init` command
pub struct InitArgs {
    /// Configuration file
    pub config: PathBuf,
    /// Drop and recreate existing sink tables
    pub recreate: bool,
}

/// Handle the `init` command
pub fn handle_init(args: &InitArgs) -> Result<(), CliError> {
    let config = super::load_config(&args.config)?;
    let mode = if args.recreate {
        ProvisionMode::Recreate
    } else {
        ProvisionMode::CreateMissing
    };

    let report = crate::provision_warehouse(&config, mode)?;

    eprintln!(
        "Warehouse {} provisioned",
        config.warehouse.database.display()
    );
    eprintln!("  Schemas: {}", report.schemas.join(", "));
    for table in &report.tables {
        eprintln!("  - {}", table);
    }
    Ok(())
}
