//! The merged configuration tree and per-module slices

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::node::{ConfigNode, ConfigTree};
use crate::secret::SecretHandle;

/// Reserved slice key that overrides a module's default enablement.
pub const ENABLED_KEY: &str = "enabled";

static EMPTY_TREE: ConfigTree = ConfigTree::new();

/// The final configuration after merging every layer.
///
/// Consumers only ever see read-only views of it: whole-tree lookups via
/// [`get`](Self::get) or per-module slices via [`module`](Self::module).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    tree: ConfigTree,
    sources: Vec<String>,
}

impl ResolvedConfig {
    /// Wrap a merged tree together with the sources it was built from
    pub fn new(tree: ConfigTree, sources: Vec<String>) -> Self {
        Self { tree, sources }
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Layer sources that contributed, lowest precedence first
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Replace the tree while keeping provenance.
    ///
    /// Used by post-processing steps such as secret resolution.
    pub fn with_tree(self, tree: ConfigTree) -> Self {
        Self {
            tree,
            sources: self.sources,
        }
    }

    /// Look up a node by dotted path
    pub fn get(&self, path: &str) -> Option<&ConfigNode> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let first = segments.next()?;
        segments.try_fold(self.tree.get(first)?, |node, segment| node.child(segment))
    }

    /// Clone the whole configuration as a single tree node
    pub fn to_node(&self) -> ConfigNode {
        ConfigNode::Tree(self.tree.clone())
    }

    /// Borrow the configuration slice namespaced under a module identifier.
    ///
    /// A module without a namespace receives an empty slice.
    pub fn module<'a>(&'a self, module: &'a str) -> ModuleConfig<'a> {
        let tree = match self.tree.get(module) {
            Some(ConfigNode::Tree(tree)) => tree,
            Some(other) => {
                tracing::warn!(
                    module,
                    kind = other.kind(),
                    "Module namespace is not a tree, using an empty slice"
                );
                &EMPTY_TREE
            }
            None => &EMPTY_TREE,
        };
        ModuleConfig { module, tree }
    }
}

/// Read-only view of one module's configuration.
#[derive(Debug, Clone, Copy)]
pub struct ModuleConfig<'a> {
    module: &'a str,
    tree: &'a ConfigTree,
}

impl<'a> ModuleConfig<'a> {
    /// Identifier of the module this slice belongs to
    pub fn module(&self) -> &'a str {
        self.module
    }

    pub fn tree(&self) -> &'a ConfigTree {
        self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Look up a value by dotted path relative to the slice
    pub fn get(&self, path: &str) -> Option<&'a ConfigNode> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let first = segments.next()?;
        segments.try_fold(self.tree.get(first)?, |node, segment| node.child(segment))
    }

    /// Shortcut for string values
    pub fn get_str(&self, path: &str) -> Option<&'a str> {
        self.get(path).and_then(ConfigNode::as_str)
    }

    /// Handle stored at `path`, if the value there is a secret.
    pub fn secret(&self, path: &str) -> Option<&'a SecretHandle> {
        self.get(path).and_then(ConfigNode::as_secret)
    }

    /// Explicit `enabled` flag from configuration, if present.
    pub fn enabled(&self) -> Option<bool> {
        self.tree.get(ENABLED_KEY).and_then(ConfigNode::as_bool)
    }

    /// Effective enablement given the module's registered default
    pub fn is_enabled(&self, default: bool) -> bool {
        self.enabled().unwrap_or(default)
    }

    /// Deserialize the slice into a typed configuration object.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidModuleConfig` if the slice does not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let value = ConfigNode::Tree(self.tree.clone()).to_json();
        serde_json::from_value(value).map_err(|e| Error::InvalidModuleConfig {
            module: self.module.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ResolvedConfig {
        let tree = ConfigNode::from(value).into_tree().unwrap();
        ResolvedConfig::new(tree, vec!["test".into()])
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct NetworkConfig {
        cidr: String,
        #[serde(default)]
        public_subnets: u32,
        password: SecretHandle,
    }

    #[test]
    fn test_module_slice_and_missing_namespace() {
        let resolved = config(json!({ "network": { "cidr": "10.0.0.0/16" } }));

        let slice = resolved.module("network");
        assert_eq!(slice.module(), "network");
        assert_eq!(slice.get_str("cidr"), Some("10.0.0.0/16"));

        let empty = resolved.module("cluster");
        assert!(empty.is_empty());
        assert!(empty.is_enabled(true));
    }

    #[test]
    fn test_enabled_flag_overrides_default() {
        let resolved = config(json!({
            "network": { "enabled": false },
            "dns": { "enabled": true }
        }));
        assert!(!resolved.module("network").is_enabled(true));
        assert!(resolved.module("dns").is_enabled(false));
        assert!(!resolved.module("cache").is_enabled(false));
    }

    #[test]
    fn test_typed_deserialize() {
        let resolved = config(json!({
            "network": {
                "cidr": "10.0.0.0/16",
                "password": "secret://memory/k1"
            }
        }));

        let typed: NetworkConfig = resolved.module("network").deserialize().unwrap();
        assert_eq!(
            typed,
            NetworkConfig {
                cidr: "10.0.0.0/16".into(),
                public_subnets: 0,
                password: SecretHandle::new("memory", "k1"),
            }
        );
    }

    #[test]
    fn test_typed_deserialize_reports_module() {
        let resolved = config(json!({ "network": { "cidr": 42 } }));
        let err = resolved
            .module("network")
            .deserialize::<NetworkConfig>()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModuleConfig { ref module, .. } if module == "network"));
    }

    #[test]
    fn test_get_dotted_path() {
        let resolved = config(json!({ "a": { "b": { "c": 1 } } }));
        assert_eq!(resolved.get("a.b.c"), Some(&ConfigNode::Integer(1)));
        assert!(resolved.get("").is_none());
        assert!(resolved.get("a.x").is_none());
    }
}
