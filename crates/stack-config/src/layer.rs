//! Configuration layers and the per-tier layer store

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::{ConfigNode, ConfigTree};

/// Precedence tier of a configuration layer.
///
/// Variants are declared lowest precedence first, so the derived ordering
/// matches merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precedence {
    Defaults,
    Organization,
    Project,
    Stack,
    Runtime,
}

impl Precedence {
    /// All tiers, lowest precedence first
    pub const ALL: [Precedence; 5] = [
        Precedence::Defaults,
        Precedence::Organization,
        Precedence::Project,
        Precedence::Stack,
        Precedence::Runtime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Precedence::Defaults => "defaults",
            Precedence::Organization => "organization",
            Precedence::Project => "project",
            Precedence::Stack => "stack",
            Precedence::Runtime => "runtime",
        }
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tier of raw configuration.
///
/// A layer is immutable once built; re-loading a source produces a new
/// layer that supersedes the old one in the [`LayerStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    precedence: Precedence,
    source: String,
    tree: ConfigTree,
}

impl ConfigLayer {
    /// Create a layer from a parsed tree
    ///
    /// # Arguments
    ///
    /// * `precedence` - The tier this layer belongs to
    /// * `source` - Human-readable origin (file path, `env`, ...) used in diagnostics
    /// * `tree` - The raw configuration
    pub fn new(precedence: Precedence, source: impl Into<String>, tree: ConfigTree) -> Self {
        Self {
            precedence,
            source: source.into(),
            tree,
        }
    }

    /// Create a layer from an arbitrary node.
    ///
    /// A layer's root must be a tree; any other node yields an empty layer.
    pub fn from_node(precedence: Precedence, source: impl Into<String>, node: ConfigNode) -> Self {
        let source = source.into();
        let tree = match node {
            ConfigNode::Tree(tree) => tree,
            ConfigNode::Null => ConfigTree::new(),
            other => {
                tracing::warn!(
                    %source,
                    kind = other.kind(),
                    "Layer root is not a tree, treating it as empty"
                );
                ConfigTree::new()
            }
        };
        Self::new(precedence, source, tree)
    }

    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// Storage for the loaded layers, at most one per precedence tier.
///
/// The store holds no merge logic; see [`ConfigMerger`](crate::ConfigMerger).
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    layers: BTreeMap<Precedence, ConfigLayer>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a layer, returning the layer it supersedes in the same tier.
    pub fn insert(&mut self, layer: ConfigLayer) -> Option<ConfigLayer> {
        let previous = self.layers.insert(layer.precedence(), layer);
        if let Some(previous) = &previous {
            tracing::debug!(
                precedence = %previous.precedence(),
                source = previous.source(),
                "Superseding previously loaded layer"
            );
        }
        previous
    }

    pub fn get(&self, precedence: Precedence) -> Option<&ConfigLayer> {
        self.layers.get(&precedence)
    }

    /// Iterate the stored layers lowest precedence first.
    pub fn ordered(&self) -> impl Iterator<Item = &ConfigLayer> {
        self.layers.values()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl FromIterator<ConfigLayer> for LayerStore {
    fn from_iter<I: IntoIterator<Item = ConfigLayer>>(iter: I) -> Self {
        let mut store = Self::new();
        for layer in iter {
            store.insert(layer);
        }
        store
    }
}
