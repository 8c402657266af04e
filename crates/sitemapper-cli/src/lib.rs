//! sitemapper CLI - XML sitemaps from CMS site snapshots
//!
//! Command implementations live in [`commands`]; this module parses
//! arguments, sets up logging and dispatches.
use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
pub mod error;
mod output;
mod utils;

use crate::utils::initialize_logging;
use cli::{Cli, Commands};

/// Execute the sitemapper CLI with the current process arguments.
///
/// # Errors
///
/// Returns an error if configuration loading or command execution fails.
/// Use [`error::exit_code_from_error`] to turn it into an exit code.
pub fn run() -> Result<()> {
    // Convert Broken pipe panics into a clean exit
    std::panic::set_hook(Box::new(|info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") || msg.contains("broken pipe") {
            std::process::exit(0);
        }
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();
    initialize_logging(&cli)?;
    execute_command(cli)
}

fn execute_command(cli: Cli) -> Result<()> {
    let explicit = cli.config.as_deref();
    let format = cli.command.format().unwrap_or_default();

    match cli.command {
        Commands::Config { command } => commands::config(command, explicit),
        Commands::Generate { debug, .. } => {
            let (service, _) = commands::load_service(explicit)?;
            commands::generate(&service, debug, format)
        },
        Commands::Delete { .. } => {
            let (service, _) = commands::load_service(explicit)?;
            commands::delete(&service, format)
        },
        Commands::Cron { key, .. } => {
            let (service, _) = commands::load_service(explicit)?;
            commands::cron(&service, key.as_deref(), format)
        },
        Commands::Status { .. } => {
            let (service, _) = commands::load_service(explicit)?;
            commands::status(&service, format)
        },
    }
}
