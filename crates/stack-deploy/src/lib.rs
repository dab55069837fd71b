//! Deployment orchestration for Stack Manager
//!
//! This crate ties the lower layers together:
//!
//! - **Planner**: merges configuration layers, resolves secure values and
//!   computes a dependency-respecting order for the enabled modules
//! - **DeploymentManager**: invokes each module's entry point in that order
//!   and records one [`DeploymentResult`] per module
//!
//! # Architecture
//!
//! ```text
//!                 stack-cli
//!                     |
//!               stack-deploy
//!                     |
//!     +---------------+---------------+
//!     |               |               |
//! stack-config  stack-secrets  stack-modules
//! ```
//!
//! Structural problems (unknown modules, cycles, merge conflicts) abort
//! planning before any module runs. Once deployment starts, failures are
//! contained per module: [`DeploymentManager::deploy_all`] never returns an
//! error, and callers inspect the [`DeploymentReport`] instead.
//!
//! # Example
//!
//! ```
//! use stack_config::{ConfigLayer, ConfigNode, LayerStore, Precedence};
//! use stack_deploy::{DeployContext, DeploymentManager, FnModule, ModuleOutput, ModuleTable, Planner};
//! use stack_modules::{ModuleDescriptor, ModuleRegistry};
//! use serde_json::json;
//!
//! let mut registry = ModuleRegistry::new();
//! registry.register(ModuleDescriptor::new("network")).unwrap();
//!
//! let mut modules = ModuleTable::new();
//! modules
//!     .register("network", FnModule::new(|config, _ctx| {
//!         let cidr = config.get_str("cidr").unwrap_or("10.0.0.0/16");
//!         Ok(ModuleOutput::new().with_message(format!("created {cidr}")))
//!     }))
//!     .unwrap();
//!
//! let store: LayerStore = [ConfigLayer::from_node(
//!     Precedence::Project,
//!     "Stack.toml",
//!     ConfigNode::from(json!({ "network": { "cidr": "10.1.0.0/16" } })),
//! )]
//! .into_iter()
//! .collect();
//!
//! let plan = Planner::new(&registry).plan(&store).unwrap();
//! let manager = DeploymentManager::new(
//!     plan.config().clone(),
//!     registry,
//!     modules,
//!     DeployContext::new("dev"),
//! );
//! let report = manager.deploy_all(plan.order());
//!
//! assert!(report.is_success());
//! assert_eq!(report.get("network").unwrap().message(), "created 10.1.0.0/16");
//! ```

pub mod context;
pub mod error;
pub mod manager;
pub mod module;
pub mod plan;
pub mod report;

pub use context::DeployContext;
pub use error::{Error, Result};
pub use manager::DeploymentManager;
pub use module::{BoxError, FnModule, Module, ModuleOutput, ModuleTable};
pub use plan::{DeploymentPlan, Planner};
pub use report::{DeploymentReport, DeploymentResult, DeploymentStatus, DeploymentSummary};
