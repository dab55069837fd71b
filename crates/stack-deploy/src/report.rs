//! Per-module deployment outcomes

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::module::ModuleOutput;

/// Outcome category of one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Entry point ran and returned normally
    Deployed,
    /// Module is disabled; entry point was not invoked
    Skipped,
    /// Entry point errored or panicked, or no implementation exists
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployed => "deployed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one module in one run. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentResult {
    module: String,
    status: DeploymentStatus,
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<Value>,
    duration_ms: u64,
}

impl DeploymentResult {
    pub(crate) fn deployed(module: &str, output: ModuleOutput, elapsed: Duration) -> Self {
        Self::build(
            module,
            DeploymentStatus::Deployed,
            output.message.unwrap_or_else(|| "deployed".to_string()),
            output.data,
            elapsed,
        )
    }

    pub(crate) fn skipped(module: &str) -> Self {
        Self::build(
            module,
            DeploymentStatus::Skipped,
            "module is disabled".to_string(),
            None,
            Duration::ZERO,
        )
    }

    pub(crate) fn failed(module: &str, message: String, elapsed: Duration) -> Self {
        Self::build(module, DeploymentStatus::Failed, message, None, elapsed)
    }

    fn build(
        module: &str,
        status: DeploymentStatus,
        message: String,
        output: Option<Value>,
        elapsed: Duration,
    ) -> Self {
        Self {
            module: module.to_string(),
            status,
            success: status != DeploymentStatus::Failed,
            message,
            output,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    /// `false` only for [`DeploymentStatus::Failed`]
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    pub deployed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DeploymentSummary {
    pub fn total(&self) -> usize {
        self.deployed + self.skipped + self.failed
    }
}

impl fmt::Display for DeploymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deployed, {} skipped, {} failed",
            self.deployed, self.skipped, self.failed
        )
    }
}

/// Results of one run, keyed by module and kept in execution order.
///
/// Entries are write-once: recording a second result for a module that
/// already has one is refused.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploymentReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<Uuid>,
    results: Vec<DeploymentResult>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl DeploymentReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_run(run_id: Uuid) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    /// Run that produced these results, if any
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Append a result. Returns `false` if the module was already recorded.
    pub(crate) fn record(&mut self, result: DeploymentResult) -> bool {
        if self.index.contains_key(result.module()) {
            tracing::warn!(module = result.module(), "Ignoring second result for module");
            return false;
        }
        self.index
            .insert(result.module().to_string(), self.results.len());
        self.results.push(result);
        true
    }

    /// Append every result of another report, keeping existing entries
    pub(crate) fn absorb(&mut self, other: DeploymentReport) {
        for result in other.results {
            self.record(result);
        }
    }

    pub fn get(&self, module: &str) -> Option<&DeploymentResult> {
        self.index.get(module).map(|&i| &self.results[i])
    }

    pub fn contains(&self, module: &str) -> bool {
        self.index.contains_key(module)
    }

    /// Results in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &DeploymentResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when no module failed
    pub fn is_success(&self) -> bool {
        self.results.iter().all(DeploymentResult::success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeploymentResult> {
        self.results.iter().filter(|r| !r.success())
    }

    pub fn summary(&self) -> DeploymentSummary {
        let mut summary = DeploymentSummary::default();
        for result in &self.results {
            match result.status() {
                DeploymentStatus::Deployed => summary.deployed += 1,
                DeploymentStatus::Skipped => summary.skipped += 1,
                DeploymentStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

impl<'a> IntoIterator for &'a DeploymentReport {
    type Item = &'a DeploymentResult;
    type IntoIter = std::slice::Iter<'a, DeploymentResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
