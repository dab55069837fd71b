//! Planning: from configuration layers to an executable order
//!
//! Everything that can fail structurally happens here, before any module
//! runs: merge conflicts, unknown modules and dependency cycles all abort
//! planning with an error.

use std::sync::Arc;

use stack_config::{ConfigMerger, LayerStore, ResolvedConfig};
use stack_modules::{DependencyResolver, ModuleRegistry};
use stack_secrets::{InMemoryBackend, SecretResolver};

use crate::context::DeployContext;
use crate::error::Result;

/// Output of [`Planner::plan`]
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    config: ResolvedConfig,
    order: Vec<String>,
    levels: Vec<Vec<String>>,
    secrets: SecretResolver,
}

impl DeploymentPlan {
    /// Merged configuration with secure values already replaced by handles
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// `order` grouped into levels of mutually independent modules
    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    pub fn secrets(&self) -> &SecretResolver {
        &self.secrets
    }

    /// A fresh run context able to dereference this plan's secret handles
    pub fn context(&self, stack: impl Into<String>) -> DeployContext {
        DeployContext::new(stack).with_secrets(self.secrets.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Composes merging, secret resolution and ordering.
#[derive(Debug, Clone)]
pub struct Planner<'r> {
    registry: &'r ModuleRegistry,
    merger: ConfigMerger,
    secrets: SecretResolver,
}

impl<'r> Planner<'r> {
    /// Planner with the default merge policy and an in-memory secret backend
    pub fn new(registry: &'r ModuleRegistry) -> Self {
        Self {
            registry,
            merger: ConfigMerger::new(),
            secrets: SecretResolver::new(Arc::new(InMemoryBackend::new())),
        }
    }

    pub fn with_merger(mut self, merger: ConfigMerger) -> Self {
        self.merger = merger;
        self
    }

    pub fn with_secrets(mut self, secrets: SecretResolver) -> Self {
        self.secrets = secrets;
        self
    }

    /// Merge the layers and resolve secrets without ordering anything
    pub fn resolve_config(&self, store: &LayerStore) -> Result<ResolvedConfig> {
        let merged = self.merger.merge_store(store)?;
        Ok(self.secrets.resolve(&merged)?)
    }

    /// Plan every module enabled under the merged configuration.
    ///
    /// # Errors
    ///
    /// Merge conflicts, secret backend failures and dependency cycles.
    pub fn plan(&self, store: &LayerStore) -> Result<DeploymentPlan> {
        let config = self.resolve_config(store)?;
        let enabled = self.registry.enabled(&config);
        self.build(config, &enabled)
    }

    /// Plan an explicit set of modules.
    ///
    /// The set is ordered as given. Disabled modules stay in the plan and
    /// are reported as skipped at deploy time.
    ///
    /// # Errors
    ///
    /// As [`Planner::plan`], plus `UnknownModule` for unregistered
    /// identifiers.
    pub fn plan_for<S: AsRef<str>>(&self, store: &LayerStore, requested: &[S]) -> Result<DeploymentPlan> {
        let config = self.resolve_config(store)?;
        self.build(config, requested)
    }

    fn build<S: AsRef<str>>(&self, config: ResolvedConfig, requested: &[S]) -> Result<DeploymentPlan> {
        let resolver = DependencyResolver::new(self.registry);
        let order = resolver.order(requested)?;
        let levels = resolver.levels(&order)?;

        tracing::info!(
            modules = order.len(),
            levels = levels.len(),
            sources = ?config.sources(),
            "Planned deployment"
        );

        Ok(DeploymentPlan {
            config,
            order,
            levels,
            secrets: self.secrets.clone(),
        })
    }
}
