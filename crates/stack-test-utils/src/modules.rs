//! Scripted module implementations.
//!
//! Each module behaves deterministically so tests can assert on exactly
//! which entry points ran and in what order.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use stack_config::{ConfigNode, ModuleConfig};
use stack_deploy::{BoxError, DeployContext, Module, ModuleOutput, ModuleTable};

/// Shared, ordered log of module invocations.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of modules invoked so far, in invocation order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn count(&self, module: &str) -> usize {
        self.entries.lock().iter().filter(|id| *id == module).count()
    }

    fn push(&self, module: &str) {
        self.entries.lock().push(module.to_string());
    }
}

/// What a [`ScriptedModule`] does when invoked.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Succeed, echoing the module's configuration slice as output data
    Echo,
    /// Succeed with fixed output data
    Output(Value),
    /// Return an error with this message
    Fail(String),
    /// Panic with this message
    Panic(String),
    /// Fail unless every listed module has recorded output data
    Requires(Vec<String>),
}

/// A module that logs itself to a [`Journal`] then acts out a [`Behavior`].
#[derive(Debug, Clone)]
pub struct ScriptedModule {
    id: String,
    journal: Journal,
    behavior: Behavior,
}

impl ScriptedModule {
    pub fn new(id: &str, journal: &Journal, behavior: Behavior) -> Self {
        Self {
            id: id.to_string(),
            journal: journal.clone(),
            behavior,
        }
    }
}

impl Module for ScriptedModule {
    fn deploy(&self, config: &ModuleConfig<'_>, ctx: &DeployContext) -> Result<ModuleOutput, BoxError> {
        self.journal.push(&self.id);

        match &self.behavior {
            Behavior::Echo => Ok(ModuleOutput::new()
                .with_message(format!("{} deployed", self.id))
                .with_data(ConfigNode::Tree(config.tree().clone()).to_json())),
            Behavior::Output(data) => Ok(ModuleOutput::new()
                .with_message(format!("{} deployed", self.id))
                .with_data(data.clone())),
            Behavior::Fail(message) => Err(message.clone().into()),
            Behavior::Panic(message) => panic!("{message}"),
            Behavior::Requires(dependencies) => {
                for dependency in dependencies {
                    if ctx.output(dependency).is_none() {
                        return Err(format!("missing output from '{dependency}'").into());
                    }
                }
                Ok(ModuleOutput::new()
                    .with_message(format!("{} deployed", self.id))
                    .with_data(Value::Bool(true)))
            }
        }
    }
}

/// Build a table of scripted modules sharing one journal.
pub fn scripted_table(journal: &Journal, modules: &[(&str, Behavior)]) -> ModuleTable {
    let mut table = ModuleTable::new();
    for (id, behavior) in modules {
        table
            .register(*id, ScriptedModule::new(id, journal, behavior.clone()))
            .unwrap();
    }
    table
}
