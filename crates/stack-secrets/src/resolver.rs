//! Replacement of secure plaintext with backend handles

use std::sync::Arc;

use stack_config::{ConfigNode, ConfigTree, ResolvedConfig, SecretHandle};

use crate::backend::SecretBackend;
use crate::error::Result;
use crate::plaintext::Plaintext;

/// Moves secure values out of configuration trees and into a backend.
///
/// Resolution is idempotent: nodes that already hold a handle are left
/// untouched. Plaintext is never logged; diagnostics mention paths only.
#[derive(Clone)]
pub struct SecretResolver {
    backend: Arc<dyn SecretBackend>,
}

impl SecretResolver {
    pub fn new(backend: Arc<dyn SecretBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn SecretBackend {
        self.backend.as_ref()
    }

    /// Return a copy of `config` with every secure node replaced by a handle.
    ///
    /// # Errors
    ///
    /// Fails if the backend refuses to store a value. The input is left
    /// unchanged and no partially resolved tree is returned.
    pub fn resolve(&self, config: &ResolvedConfig) -> Result<ResolvedConfig> {
        let tree = self.resolve_tree(config.tree().clone())?;
        Ok(config.clone().with_tree(tree))
    }

    /// Resolve secure nodes within a bare tree
    pub fn resolve_tree(&self, mut tree: ConfigTree) -> Result<ConfigTree> {
        let mut path = Vec::new();
        let mut converted = 0usize;
        for (key, node) in tree.iter_mut() {
            path.push(key.clone());
            self.resolve_node(node, &mut path, &mut converted)?;
            path.pop();
        }
        if converted > 0 {
            tracing::debug!(
                converted,
                backend = self.backend.name(),
                "Replaced secure values with handles"
            );
        }
        Ok(tree)
    }

    fn resolve_node(
        &self,
        node: &mut ConfigNode,
        path: &mut Vec<String>,
        converted: &mut usize,
    ) -> Result<()> {
        match node {
            ConfigNode::Secure(plaintext) => {
                let handle = self.backend.store(&Plaintext::new(plaintext.as_str()))?;
                tracing::trace!(path = %path.join("."), %handle, "Stored secure value");
                *node = ConfigNode::Secret(handle);
                *converted += 1;
            }
            ConfigNode::Tree(tree) => {
                for (key, child) in tree.iter_mut() {
                    path.push(key.clone());
                    self.resolve_node(child, path, converted)?;
                    path.pop();
                }
            }
            ConfigNode::List(items) => {
                for (index, child) in items.iter_mut().enumerate() {
                    path.push(index.to_string());
                    self.resolve_node(child, path, converted)?;
                    path.pop();
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Fetch the plaintext behind a handle.
    ///
    /// This is the only way a module obtains a secret's value.
    pub fn dereference(&self, handle: &SecretHandle) -> Result<Plaintext> {
        self.backend.fetch(handle)
    }
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("backend", &self.backend.name())
            .finish()
    }
}
