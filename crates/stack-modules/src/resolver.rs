//! Dependency-ordered scheduling of requested modules
//!
//! The resolver performs a depth-first topological sort restricted to the
//! requested set. A dependency on a module outside that set is not a
//! scheduling constraint and is ignored, whether or not it is registered.
//!
//! Ties between independent modules are broken by the order of the
//! requested slice, so a fixed input always yields the same output.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::registry::ModuleRegistry;

/// Computes execution orders over a [`ModuleRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'r> {
    registry: &'r ModuleRegistry,
}

impl<'r> DependencyResolver<'r> {
    pub fn new(registry: &'r ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Order `requested` so that every module follows its requested
    /// dependencies.
    ///
    /// Repeated identifiers in `requested` are ignored after their first
    /// occurrence.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownModule` if a requested identifier is not registered
    /// - `Error::CircularDependency` if the requested subset contains a cycle
    pub fn order<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<String>> {
        let mut wanted = Vec::with_capacity(requested.len());
        let mut in_set = HashSet::with_capacity(requested.len());
        for id in requested {
            let id = id.as_ref();
            self.registry.get(id)?;
            if in_set.insert(id.to_string()) {
                wanted.push(id.to_string());
            }
        }

        let mut walk = Walk {
            registry: self.registry,
            requested: &in_set,
            visited: HashSet::new(),
            stack: Vec::new(),
            order: Vec::with_capacity(wanted.len()),
        };
        for id in &wanted {
            walk.visit(id)?;
        }

        tracing::debug!(order = ?walk.order, "Resolved deployment order");
        Ok(walk.order)
    }

    /// Group a valid order into levels of mutually independent modules.
    ///
    /// A module's level is one past the highest level among its
    /// dependencies in `order` (zero when it has none), so every module in a
    /// level only depends on modules in earlier levels. Within a level,
    /// modules keep their relative position from `order`.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownModule` if an identifier is not registered
    /// - `Error::OrderViolation` if a module precedes one of its dependencies
    pub fn levels<S: AsRef<str>>(&self, order: &[S]) -> Result<Vec<Vec<String>>> {
        let in_set: HashSet<&str> = order.iter().map(|id| id.as_ref()).collect();
        let mut level_of: HashMap<&str, usize> = HashMap::with_capacity(order.len());
        let mut levels: Vec<Vec<String>> = Vec::new();

        for id in order {
            let id = id.as_ref();
            if level_of.contains_key(id) {
                continue;
            }
            let descriptor = self.registry.get(id)?;

            let mut level = 0;
            for dep in descriptor.dependencies() {
                if !in_set.contains(dep.as_str()) {
                    continue;
                }
                match level_of.get(dep.as_str()) {
                    Some(dep_level) => level = level.max(dep_level + 1),
                    None => {
                        return Err(Error::OrderViolation {
                            module: id.to_string(),
                            dependency: dep.clone(),
                        });
                    }
                }
            }

            level_of.insert(id, level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(id.to_string());
        }

        Ok(levels)
    }
}

/// Depth-first traversal state.
///
/// `stack` holds the modules currently being visited (the "on stack" set);
/// `visited` holds modules whose subtree is complete.
struct Walk<'a> {
    registry: &'a ModuleRegistry,
    requested: &'a HashSet<String>,
    visited: HashSet<String>,
    stack: Vec<String>,
    order: Vec<String>,
}

impl Walk<'_> {
    fn visit(&mut self, id: &str) -> Result<()> {
        if self.visited.contains(id) {
            return Ok(());
        }
        if let Some(start) = self.stack.iter().position(|on_stack| on_stack == id) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(id.to_string());
            return Err(Error::CircularDependency {
                module: id.to_string(),
                cycle,
            });
        }

        let registry = self.registry;
        let descriptor = registry.get(id)?;
        self.stack.push(id.to_string());
        for dep in descriptor.dependencies() {
            if self.requested.contains(dep) {
                self.visit(dep)?;
            }
        }
        self.stack.pop();

        self.visited.insert(id.to_string());
        self.order.push(id.to_string());
        Ok(())
    }
}
