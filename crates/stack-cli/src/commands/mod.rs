//! Command implementations for stack-cli

pub mod modules;
pub mod plan;
pub mod resolve;

pub use modules::run_modules;
pub use plan::run_plan;
pub use resolve::run_resolve;

use std::fs;
use std::path::Path;

use serde_json::Value;
use stack_config::{LayerLoader, LayerStore};
use stack_modules::ModuleRegistry;

use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};

/// Load every configuration layer for the selected project and stack
pub(crate) fn load_store(project: &ProjectArgs) -> Result<LayerStore> {
    if !project.root.is_dir() {
        return Err(CliError::user(format!(
            "project root '{}' is not a directory",
            project.root.display()
        )));
    }

    let mut loader = LayerLoader::new(&project.root, &project.stack);
    if let Some(ref org_dir) = project.org_dir {
        loader = loader.with_org_dir(org_dir);
    }
    Ok(loader.load()?)
}

/// Read a module catalog into a registry
pub(crate) fn load_registry(path: &Path) -> Result<ModuleRegistry> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(ModuleRegistry::from_catalog(&content)?)
}

/// Flatten a JSON value into `dotted.path = value` pairs.
///
/// Empty objects and arrays are kept as leaves so they stay visible.
pub(crate) fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf.to_string())),
    }
}
