//! Resolve command: print the merged configuration

use std::sync::Arc;

use colored::Colorize;
use serde_json::Value;
use stack_config::{ConfigMerger, ConfigNode};
use stack_secrets::{InMemoryBackend, SecretResolver};

use super::{flatten, load_store};
use crate::cli::ProjectArgs;
use crate::error::Result;

/// Run the resolve command
pub fn run_resolve(project: &ProjectArgs, module: Option<&str>, json: bool) -> Result<()> {
    let store = load_store(project)?;
    let merged = ConfigMerger::new().merge_store(&store)?;
    let config = SecretResolver::new(Arc::new(InMemoryBackend::new())).resolve(&merged)?;

    let value: Value = match module {
        Some(id) => {
            let slice = config.module(id);
            if slice.is_empty() {
                eprintln!(
                    "{} module '{}' has no configuration",
                    "warning:".yellow().bold(),
                    id
                );
            }
            ConfigNode::Tree(slice.tree().clone()).to_json()
        }
        None => config.to_node().to_json(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Stack".bold(),
        project.stack.cyan().bold(),
        config.sources().join(" < ").dimmed()
    );
    println!();

    let mut entries = Vec::new();
    flatten("", &value, &mut entries);
    for (path, rendered) in entries {
        println!("  {} = {}", path.green(), rendered);
    }

    Ok(())
}
