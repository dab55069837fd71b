//! Shared state handed to every module in a run

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use stack_config::SecretHandle;
use stack_secrets::{Plaintext, SecretResolver};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Context shared by all modules of one deployment run.
///
/// Holds the outputs of modules that already deployed successfully, so a
/// module can consume values produced by its dependencies. Every run started
/// through a [`DeploymentManager`](crate::DeploymentManager) gets a fresh
/// run id and an empty output map; both are safe to read from concurrent
/// workers.
#[derive(Debug)]
pub struct DeployContext {
    run_id: RwLock<Uuid>,
    stack: String,
    started_at: DateTime<Utc>,
    secrets: Option<SecretResolver>,
    outputs: RwLock<HashMap<String, Value>>,
}

impl DeployContext {
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            run_id: RwLock::new(Uuid::new_v4()),
            stack: stack.into(),
            started_at: Utc::now(),
            secrets: None,
            outputs: RwLock::new(HashMap::new()),
        }
    }

    /// Attach the resolver whose backend holds this run's secrets
    pub fn with_secrets(mut self, secrets: SecretResolver) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Identifier of the current (or most recent) run
    pub fn run_id(&self) -> Uuid {
        *self.run_id.read()
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fetch the plaintext behind a handle from the run's secret backend.
    ///
    /// # Errors
    ///
    /// `Error::SecretsUnavailable` if no backend is attached, or the
    /// backend's lookup error.
    pub fn secret(&self, handle: &SecretHandle) -> Result<Plaintext> {
        let secrets = self.secrets.as_ref().ok_or(Error::SecretsUnavailable)?;
        Ok(secrets.dereference(handle)?)
    }

    /// Output data recorded by a module earlier in this run
    pub fn output(&self, module: &str) -> Option<Value> {
        self.outputs.read().get(module).cloned()
    }

    /// Snapshot of every recorded output
    pub fn outputs(&self) -> HashMap<String, Value> {
        self.outputs.read().clone()
    }

    pub(crate) fn record_output(&self, module: &str, data: Value) {
        self.outputs.write().insert(module.to_string(), data);
    }

    /// Start a new run: fresh id, no outputs
    pub(crate) fn begin_run(&self) -> Uuid {
        let run_id = Uuid::new_v4();
        *self.run_id.write() = run_id;
        self.outputs.write().clear();
        run_id
    }
}
