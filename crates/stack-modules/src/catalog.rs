//! Static module catalog files
//!
//! A catalog declares module descriptors in TOML so that tooling can plan a
//! deployment without linking the module implementations:
//!
//! ```toml
//! [modules.network]
//!
//! [modules.cluster]
//! depends_on = ["network"]
//!
//! [modules.monitoring]
//! depends_on = ["cluster"]
//! enabled = false
//! ```
//!
//! Modules are registered in identifier order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::ModuleDescriptor;
use crate::error::Result;
use crate::registry::ModuleRegistry;

fn default_enabled() -> bool {
    true
}

/// One `[modules.<id>]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Parsed catalog file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub modules: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Convert entries into descriptors, in identifier order
    pub fn descriptors(&self) -> Vec<ModuleDescriptor> {
        self.modules
            .iter()
            .map(|(id, entry)| {
                ModuleDescriptor::new(id.as_str())
                    .depends_on(entry.depends_on.iter().cloned())
                    .with_enabled_by_default(entry.enabled)
            })
            .collect()
    }

    /// Build a registry holding every catalog entry.
    pub fn into_registry(self) -> Result<ModuleRegistry> {
        let mut registry = ModuleRegistry::new();
        registry.register_all(self.descriptors())?;
        Ok(registry)
    }
}

impl ModuleRegistry {
    /// Parse a TOML catalog straight into a registry.
    pub fn from_catalog(content: &str) -> Result<Self> {
        Catalog::parse(content)?.into_registry()
    }
}
