//! Shared test utilities for the stack-manager workspace.
//!
//! This crate provides fixtures reused across crate test suites. It is a
//! dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`modules`]: scripted [`Module`](stack_deploy::Module) implementations
//! - [`project`]: [`TestProject`](project::TestProject) builder for on-disk
//!   configuration layouts

pub mod modules;
pub mod project;
