//! bronze-ingest: load raw extracts into the warehouse bronze layer
//!
//! Usage:
//!     bronze-ingest init --config config/bronze.toml
//!     bronze-ingest datasets --config config/bronze.toml
//!     bronze-ingest run --config config/bronze.toml [--json] [--no-progress]

use std::path::PathBuf;
use std::process::ExitCode;

use bronze_ingest::cli::commands::datasets::{DatasetsArgs, handle_datasets};
use bronze_ingest::cli::commands::init::{InitArgs, handle_init};
use bronze_ingest::cli::commands::run::{RunArgs, handle_run};
use bronze_ingest::cli::{CliError, init_logging};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "bronze-ingest",
    version,
    about = "Load raw CRM/ERP extracts into the bronze layer"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the warehouse schemas and sink tables
    Init {
        /// Configuration file
        #[arg(short, long, default_value = "config/bronze.toml")]
        config: PathBuf,

        /// Drop and recreate existing sink tables
        #[arg(long)]
        recreate: bool,
    },

    /// List the configured datasets in load order
    Datasets {
        /// Configuration file
        #[arg(short, long, default_value = "config/bronze.toml")]
        config: PathBuf,
    },

    /// Clear and reload every dataset
    Run {
        /// Configuration file
        #[arg(short, long, default_value = "config/bronze.toml")]
        config: PathBuf,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

fn dispatch(command: Command) -> Result<(), CliError> {
    match command {
        Command::Init { config, recreate } => handle_init(&InitArgs { config, recreate }),
        Command::Datasets { config } => handle_datasets(&DatasetsArgs { config }),
        Command::Run {
            config,
            json,
            no_progress,
        } => handle_run(&RunArgs {
            config,
            json,
            no_progress,
        }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
