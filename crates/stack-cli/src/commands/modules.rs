//! Modules command: list catalog entries

use std::path::Path;

use colored::Colorize;

use super::load_registry;
use crate::error::Result;

/// Run the modules command
pub fn run_modules(catalog: &Path) -> Result<()> {
    let registry = load_registry(catalog)?;

    println!("{}", "Modules".bold());
    println!();

    for descriptor in registry.all() {
        let dependencies = if descriptor.dependencies().is_empty() {
            "-".to_string()
        } else {
            descriptor.dependencies().join(", ")
        };
        let state = if descriptor.enabled_by_default() {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        println!(
            "  {:<16} {:<9} {} {}",
            descriptor.id().cyan(),
            state,
            "depends on:".dimmed(),
            dependencies
        );
    }

    println!();
    println!("{} {} modules", "Total:".dimmed(), registry.len());
    Ok(())
}
