//! Sequential and level-parallel execution of modules

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use stack_config::ResolvedConfig;
use stack_modules::ModuleRegistry;

use crate::context::DeployContext;
use crate::error::Error;
use crate::module::ModuleTable;
use crate::report::{DeploymentReport, DeploymentResult};

/// Runs module entry points over a resolved configuration.
///
/// The manager never reorders its input. Callers obtain a valid order from
/// [`DependencyResolver`](stack_modules::DependencyResolver), usually through
/// a [`Planner`](crate::Planner).
///
/// A module whose slice has no `enabled` key falls back to its descriptor's
/// default in `registry`. Identifiers the registry does not know are enabled
/// unless configured otherwise.
#[derive(Debug)]
pub struct DeploymentManager {
    config: ResolvedConfig,
    registry: ModuleRegistry,
    modules: ModuleTable,
    context: DeployContext,
    max_workers: usize,
}

impl DeploymentManager {
    pub fn new(
        config: ResolvedConfig,
        registry: ModuleRegistry,
        modules: ModuleTable,
        context: DeployContext,
    ) -> Self {
        Self {
            config,
            registry,
            modules,
            context,
            max_workers: thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }

    /// Cap the number of modules [`deploy_concurrent`](Self::deploy_concurrent)
    /// runs at once. Values below one are treated as one.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn context(&self) -> &DeployContext {
        &self.context
    }

    /// Deploy modules one at a time in `order`.
    ///
    /// Every identifier gets exactly one result. A failing module is
    /// recorded and the run moves on to the next identifier; this method
    /// never returns an error. Repeated identifiers are deployed once.
    pub fn deploy_all<S: AsRef<str>>(&self, order: &[S]) -> DeploymentReport {
        let mut report = self.begin_run(order.len());

        for id in order {
            let id = id.as_ref();
            if report.contains(id) {
                tracing::debug!(module = id, "Module already deployed in this run");
                continue;
            }
            report.record(self.deploy_one(id));
        }

        self.finish_run(&report);
        report
    }

    /// Deploy level by level, running the modules of one level on parallel
    /// workers.
    ///
    /// A level starts only after every module of the previous level has
    /// finished, successfully or not. At most `max_workers` modules run at
    /// once; a larger level is deployed in batches. Each worker produces its
    /// own result; results are merged into the report after the level
    /// completes, in the order the level lists them.
    pub fn deploy_concurrent<S: AsRef<str> + Sync>(&self, levels: &[Vec<S>]) -> DeploymentReport {
        let mut report = self.begin_run(levels.iter().map(Vec::len).sum());

        for (index, level) in levels.iter().enumerate() {
            let mut pending: Vec<&str> = Vec::with_capacity(level.len());
            for id in level {
                let id = id.as_ref();
                if !report.contains(id) && !pending.contains(&id) {
                    pending.push(id);
                }
            }
            tracing::debug!(level = index, modules = ?pending, "Deploying level");

            let mut partial = DeploymentReport::new();
            for batch in pending.chunks(self.max_workers) {
                thread::scope(|scope| {
                    let workers: Vec<_> = batch
                        .iter()
                        .map(|&id| (id, scope.spawn(move || self.deploy_one(id))))
                        .collect();

                    for (id, worker) in workers {
                        let result = worker.join().unwrap_or_else(|payload| {
                            DeploymentResult::failed(id, panic_message(payload.as_ref()), Duration::ZERO)
                        });
                        partial.record(result);
                    }
                });
            }
            report.absorb(partial);
        }

        self.finish_run(&report);
        report
    }

    /// Deploy a single module and describe the outcome
    pub fn deploy_one(&self, id: &str) -> DeploymentResult {
        let slice = self.config.module(id);
        let default_enabled = self
            .registry
            .get(id)
            .map_or(true, |descriptor| descriptor.enabled_by_default());
        if !slice.is_enabled(default_enabled) {
            tracing::info!(module = id, "Skipping disabled module");
            return DeploymentResult::skipped(id);
        }

        let Some(module) = self.modules.get(id) else {
            let err = Error::MissingImplementation {
                module: id.to_string(),
            };
            tracing::warn!(module = id, error = %err, "Module failed");
            return DeploymentResult::failed(id, err.to_string(), Duration::ZERO);
        };

        tracing::debug!(module = id, "Deploying module");
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| module.deploy(&slice, &self.context)));
        let elapsed = started.elapsed();

        let err = match outcome {
            Ok(Ok(output)) => {
                if let Some(data) = &output.data {
                    self.context.record_output(id, data.clone());
                }
                tracing::info!(
                    module = id,
                    duration_ms = elapsed.as_millis() as u64,
                    "Module deployed"
                );
                return DeploymentResult::deployed(id, output, elapsed);
            }
            Ok(Err(err)) => Error::ModuleExecution {
                module: id.to_string(),
                message: err.to_string(),
            },
            Err(payload) => Error::ModulePanicked {
                module: id.to_string(),
                message: panic_message(payload.as_ref()),
            },
        };

        tracing::warn!(module = id, error = %err, "Module failed");
        DeploymentResult::failed(id, err.to_string(), elapsed)
    }

    fn begin_run(&self, modules: usize) -> DeploymentReport {
        let run_id = self.context.begin_run();
        tracing::info!(
            run_id = %run_id,
            stack = self.context.stack(),
            modules,
            "Starting deployment"
        );
        DeploymentReport::for_run(run_id)
    }

    fn finish_run(&self, report: &DeploymentReport) {
        tracing::info!(
            run_id = %self.context.run_id(),
            summary = %report.summary(),
            "Deployment finished"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
