//! Append-only module registry

use std::collections::HashMap;

use stack_config::ResolvedConfig;

use crate::descriptor::ModuleDescriptor;
use crate::error::{Error, Result};

/// Catalog of every module known to this process.
///
/// Modules are registered once at startup. The registry is append-only:
/// a second registration of the same identifier is rejected rather than
/// replacing the first.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleDescriptor>,
    /// Registration order, used for stable iteration
    order: Vec<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateModule` if the identifier is already taken,
    /// or `Error::InvalidModuleId` if it cannot serve as a config namespace.
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<()> {
        descriptor.validate()?;
        if self.modules.contains_key(descriptor.id()) {
            return Err(Error::DuplicateModule {
                id: descriptor.id().to_string(),
            });
        }

        tracing::debug!(
            module = descriptor.id(),
            dependencies = ?descriptor.dependencies(),
            "Registered module"
        );
        self.order.push(descriptor.id().to_string());
        self.modules.insert(descriptor.id().to_string(), descriptor);
        Ok(())
    }

    /// Register several modules, stopping at the first failure
    pub fn register_all<I>(&mut self, descriptors: I) -> Result<()>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        descriptors
            .into_iter()
            .try_for_each(|descriptor| self.register(descriptor))
    }

    /// Look up a module by identifier.
    pub fn get(&self, id: &str) -> Result<&ModuleDescriptor> {
        self.modules
            .get(id)
            .ok_or_else(|| Error::UnknownModule { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate all descriptors.
    ///
    /// Iteration follows registration order, but callers must not rely on
    /// it for correctness. Each call starts a fresh iteration.
    pub fn all(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.order.iter().filter_map(|id| self.modules.get(id))
    }

    /// Registered identifiers in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Identifiers of modules enabled under `config`.
    ///
    /// A module's `enabled` key in its configuration slice wins over the
    /// descriptor default.
    pub fn enabled(&self, config: &ResolvedConfig) -> Vec<String> {
        self.all()
            .filter(|descriptor| {
                config
                    .module(descriptor.id())
                    .is_enabled(descriptor.enabled_by_default())
            })
            .map(|descriptor| descriptor.id().to_string())
            .collect()
    }
}
