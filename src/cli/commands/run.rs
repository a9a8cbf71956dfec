//! `run` command: load every dataset

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::cli::output::{failure_json, summary_json};
use crate::error::BronzeError;
use crate::orchestrator::{Observers, ProgressObserver, TracingObserver};

/// Arguments for the `run` command
pub struct RunArgs {
    /// Configuration file
    pub config: PathBuf,
    /// Print the run summary as JSON on stdout
    pub json: bool,
    /// Disable the progress bar
    pub no_progress: bool,
}

/// Handle the `run` command
pub fn handle_run(args: &RunArgs) -> Result<(), CliError> {
    let config = super::load_config(&args.config)?;

    let mut observers = Observers::new().with(TracingObserver);
    if !args.no_progress && !args.json {
        observers = observers.with(ProgressObserver::new());
    }

    match crate::run_bronze_load_with(&config, observers, None) {
        Ok(summary) => {
            if args.json {
                println!("{}", summary_json(&summary)?);
            } else {
                summary.print_summary();
            }
            Ok(())
        }
        Err(BronzeError::Run(failure)) => {
            if args.json {
                println!("{}", failure_json(&failure)?);
            } else {
                failure.summary.print_summary();
            }
            Err(CliError::Bronze(BronzeError::Run(failure)))
        }
        Err(e) => Err(e.into()),
    }
}
