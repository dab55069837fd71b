//! Stack Manager CLI
//!
//! Resolves layered configuration and plans dependency-ordered module
//! deployments.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not initialize logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Commands::Resolve {
            project,
            module,
            json,
        } => commands::run_resolve(&project, module.as_deref(), json),
        Commands::Plan {
            project,
            catalog,
            json,
        } => commands::run_plan(&project, catalog.as_deref(), json),
        Commands::Modules { catalog } => commands::run_modules(&catalog),
    }
}
