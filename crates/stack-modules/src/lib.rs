//! Module catalog and deployment ordering for Stack Manager.
//!
//! Modules are independently developed deployable units. Each one is
//! registered once with a [`ModuleDescriptor`] naming the modules it depends
//! on. The [`DependencyResolver`] turns a requested subset of the
//! [`ModuleRegistry`] into an execution order in which every module follows
//! the dependencies it shares with that subset.
//!
//! # Example
//!
//! ```
//! use stack_modules::{DependencyResolver, ModuleDescriptor, ModuleRegistry};
//!
//! let mut registry = ModuleRegistry::new();
//! registry.register(ModuleDescriptor::new("network")).unwrap();
//! registry.register(ModuleDescriptor::new("cluster").depends_on(["network"])).unwrap();
//!
//! let order = DependencyResolver::new(&registry).order(&["cluster", "network"]).unwrap();
//! assert_eq!(order, vec!["network", "cluster"]);
//! ```

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod resolver;

pub use catalog::{Catalog, CatalogEntry};
pub use descriptor::ModuleDescriptor;
pub use error::{Error, Result};
pub use registry::ModuleRegistry;
pub use resolver::DependencyResolver;
