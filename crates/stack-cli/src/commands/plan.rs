//! Plan command: print the deployment order

use std::path::Path;

use colored::Colorize;
use serde_json::json;
use stack_deploy::Planner;

use super::{load_registry, load_store};
use crate::cli::ProjectArgs;
use crate::error::Result;

/// Run the plan command
pub fn run_plan(project: &ProjectArgs, catalog: Option<&Path>, json: bool) -> Result<()> {
    let catalog = catalog
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project.root.join("modules.toml"));
    let registry = load_registry(&catalog)?;
    let store = load_store(project)?;

    let plan = Planner::new(&registry).plan(&store)?;
    let disabled: Vec<&str> = registry
        .ids()
        .filter(|id| !plan.order().iter().any(|planned| planned.as_str() == *id))
        .collect();

    if json {
        let out = json!({
            "stack": project.stack,
            "order": plan.order(),
            "levels": plan.levels(),
            "disabled": disabled,
            "sources": plan.config().sources(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Deployment plan for stack".bold(),
        project.stack.cyan().bold()
    );
    println!();

    if plan.is_empty() {
        println!("  {}", "No enabled modules.".dimmed());
    }
    for (position, id) in plan.order().iter().enumerate() {
        let dependencies = registry.get(id)?.dependencies();
        if dependencies.is_empty() {
            println!("  {:>2}. {}", position + 1, id.green());
        } else {
            println!(
                "  {:>2}. {} {}",
                position + 1,
                id.green(),
                format!("(after {})", dependencies.join(", ")).dimmed()
            );
        }
    }

    if plan.levels().len() > 1 {
        println!();
        println!("{}", "Levels:".bold());
        for (index, level) in plan.levels().iter().enumerate() {
            println!("  {} {}", format!("{index}:").cyan(), level.join(", "));
        }
    }

    if !disabled.is_empty() {
        println!();
        println!("{} {}", "Disabled:".yellow(), disabled.join(", "));
    }

    Ok(())
}
