//! Module implementations and the table that holds them
//!
//! A [`ModuleDescriptor`](stack_modules::ModuleDescriptor) only declares a
//! module. The code that actually provisions something implements
//! [`Module`] and is registered in a [`ModuleTable`] under the same
//! identifier.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stack_config::ModuleConfig;

use crate::context::DeployContext;
use crate::error::{Error, Result};

/// Error type returned by module entry points
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured outcome of a successful module deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ModuleOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach data that later modules can read through
    /// [`DeployContext::output`].
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Entry point of a deployable unit.
///
/// Implementations receive their own configuration slice and the shared
/// context. Returning an error or panicking marks the module as failed;
/// neither stops the rest of the run.
pub trait Module: Send + Sync {
    fn deploy(
        &self,
        config: &ModuleConfig<'_>,
        ctx: &DeployContext,
    ) -> std::result::Result<ModuleOutput, BoxError>;
}

/// Adapts a closure into a [`Module`]
pub struct FnModule<F>(F);

impl<F> FnModule<F>
where
    F: Fn(&ModuleConfig<'_>, &DeployContext) -> std::result::Result<ModuleOutput, BoxError>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Module for FnModule<F>
where
    F: Fn(&ModuleConfig<'_>, &DeployContext) -> std::result::Result<ModuleOutput, BoxError>
        + Send
        + Sync,
{
    fn deploy(
        &self,
        config: &ModuleConfig<'_>,
        ctx: &DeployContext,
    ) -> std::result::Result<ModuleOutput, BoxError> {
        (self.0)(config, ctx)
    }
}

impl<F> std::fmt::Debug for FnModule<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnModule")
    }
}

/// Module implementations keyed by identifier
#[derive(Clone, Default)]
pub struct ModuleTable {
    modules: HashMap<String, Arc<dyn Module>>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateImplementation` if `id` already has one.
    pub fn register(&mut self, id: impl Into<String>, module: impl Module + 'static) -> Result<()> {
        let id = id.into();
        if self.modules.contains_key(&id) {
            return Err(Error::DuplicateImplementation { module: id });
        }
        self.modules.insert(id, Arc::new(module));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(id).cloned()
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

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTable")
            .field("modules", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stack_config::ResolvedConfig;

    fn noop() -> impl Module {
        FnModule::new(|_config, _ctx| Ok(ModuleOutput::new()))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = ModuleTable::new();
        table.register("network", noop()).unwrap();
        table.register("cluster", noop()).unwrap();

        assert!(table.contains("network"));
        assert!(table.get("cluster").is_some());
        assert!(table.get("ghost").is_none());
        assert_eq!(table.ids(), vec!["cluster", "network"]);
    }

    #[test]
    fn test_duplicate_implementation_rejected() {
        let mut table = ModuleTable::new();
        table.register("network", noop()).unwrap();
        let err = table.register("network", noop()).unwrap_err();
        assert!(matches!(err, Error::DuplicateImplementation { ref module } if module == "network"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_fn_module_sees_its_slice() {
        let module = FnModule::new(|config, _ctx| {
            let cidr = config.get_str("cidr").ok_or("missing cidr")?;
            Ok(ModuleOutput::new()
                .with_message(format!("network {cidr}"))
                .with_data(json!({ "cidr": cidr })))
        });

        let config = ResolvedConfig::new(
            stack_config::ConfigNode::from(json!({ "network": { "cidr": "10.0.0.0/16" } }))
                .into_tree()
                .unwrap(),
            vec![],
        );
        let ctx = DeployContext::new("dev");

        let output = module.deploy(&config.module("network"), &ctx).unwrap();
        assert_eq!(output.message.as_deref(), Some("network 10.0.0.0/16"));
        assert_eq!(output.data, Some(json!({ "cidr": "10.0.0.0/16" })));

        let err = module.deploy(&config.module("cluster"), &ctx).unwrap_err();
        assert_eq!(err.to_string(), "missing cidr");
    }
}
