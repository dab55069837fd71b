//! Hierarchical merge of configuration layers
//!
//! Layers are folded lowest precedence first; on conflict the later layer
//! wins. The rules, applied node by node:
//!
//! - tree + tree: merged key by key (union of keys, recursing on shared keys)
//! - list + list, where every element of both lists is a tree carrying the
//!   same identity field (`name`, then `id`, then `key`): merged by identity.
//!   Matching elements are merged recursively, later-only elements are
//!   appended, earlier-only elements are kept
//! - anything stored under a credentials key: replaced wholesale
//! - tree over a non-null scalar: [`Error::MergeConflict`]
//! - every other pairing: the later value replaces the earlier one

use crate::error::{Error, Result};
use crate::layer::{ConfigLayer, LayerStore};
use crate::node::{ConfigNode, ConfigTree};
use crate::resolved::ResolvedConfig;

/// Knobs controlling identity and credential handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    identity_keys: Vec<String>,
    credential_keys: Vec<String>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            identity_keys: vec!["name".into(), "id".into(), "key".into()],
            credential_keys: vec!["credentials".into()],
        }
    }
}

impl MergePolicy {
    /// Identity fields tried, in order, when merging lists of trees
    pub fn with_identity_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Keys whose values are always replaced wholesale
    pub fn with_credential_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.credential_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn identity_keys(&self) -> &[String] {
        &self.identity_keys
    }

    pub fn is_credential_key(&self, key: &str) -> bool {
        self.credential_keys.iter().any(|k| k == key)
    }
}

/// Folds an ordered list of layers into one [`ResolvedConfig`].
///
/// The merger is a pure function of its inputs: it never mutates a layer,
/// and a failure in any layer returns an error without yielding a tree.
#[derive(Debug, Clone, Default)]
pub struct ConfigMerger {
    policy: MergePolicy,
}

impl ConfigMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self { policy }
    }

    /// Merge layers supplied lowest precedence first.
    ///
    /// # Errors
    ///
    /// Returns `Error::MergeConflict` naming the offending layer and path if
    /// a later value cannot be reconciled with the merged state.
    pub fn merge<'a, I>(&self, layers: I) -> Result<ResolvedConfig>
    where
        I: IntoIterator<Item = &'a ConfigLayer>,
    {
        let mut tree = ConfigTree::new();
        let mut sources = Vec::new();

        for layer in layers {
            tracing::debug!(
                precedence = %layer.precedence(),
                source = layer.source(),
                keys = layer.tree().len(),
                "Merging configuration layer"
            );
            let mut path = Vec::new();
            self.merge_tree(&mut tree, layer.tree(), layer.source(), &mut path)?;
            sources.push(layer.source().to_string());
        }

        Ok(ResolvedConfig::new(tree, sources))
    }

    /// Merge every layer held by a store, in precedence order.
    pub fn merge_store(&self, store: &LayerStore) -> Result<ResolvedConfig> {
        self.merge(store.ordered())
    }

    /// Merge two standalone nodes, `overlay` taking precedence.
    pub fn merge_nodes(&self, base: &ConfigNode, overlay: &ConfigNode) -> Result<ConfigNode> {
        let mut merged = base.clone();
        let mut path = Vec::new();
        self.merge_into(&mut merged, overlay, "<inline>", &mut path)?;
        Ok(merged)
    }

    fn merge_tree(
        &self,
        base: &mut ConfigTree,
        overlay: &ConfigTree,
        layer: &str,
        path: &mut Vec<String>,
    ) -> Result<()> {
        for (key, overlay_value) in overlay {
            path.push(key.clone());
            if self.policy.is_credential_key(key) {
                if base.contains_key(key) {
                    tracing::debug!(path = %path.join("."), "Replacing credentials wholesale");
                }
                base.insert(key.clone(), overlay_value.clone());
            } else if let Some(base_value) = base.get_mut(key) {
                self.merge_into(base_value, overlay_value, layer, path)?;
            } else {
                base.insert(key.clone(), overlay_value.clone());
            }
            path.pop();
        }
        Ok(())
    }

    fn merge_into(
        &self,
        base: &mut ConfigNode,
        overlay: &ConfigNode,
        layer: &str,
        path: &mut Vec<String>,
    ) -> Result<()> {
        if let (ConfigNode::Tree(base_tree), ConfigNode::Tree(overlay_tree)) = (&mut *base, overlay)
        {
            return self.merge_tree(base_tree, overlay_tree, layer, path);
        }

        if let (ConfigNode::List(base_items), ConfigNode::List(overlay_items)) =
            (&mut *base, overlay)
            && let Some(key) = self.shared_identity_key(base_items, overlay_items)
        {
            return self.merge_list_by_key(base_items, overlay_items, key, layer, path);
        }

        if matches!(overlay, ConfigNode::Tree(_)) && base.is_scalar() && !base.is_null() {
            return Err(Error::MergeConflict {
                layer: layer.to_string(),
                path: path.join("."),
                existing: base.kind(),
                incoming: overlay.kind(),
            });
        }

        *base = overlay.clone();
        Ok(())
    }

    /// First identity key carried as a scalar by every element of both lists.
    ///
    /// An empty side places no constraint, so an empty override of an
    /// identified list keeps every earlier element.
    fn shared_identity_key(&self, base: &[ConfigNode], overlay: &[ConfigNode]) -> Option<&str> {
        self.policy
            .identity_keys()
            .iter()
            .map(String::as_str)
            .find(|key| {
                base.iter()
                    .chain(overlay)
                    .all(|item| identity_of(item, key).is_some())
            })
    }

    fn merge_list_by_key(
        &self,
        base: &mut Vec<ConfigNode>,
        overlay: &[ConfigNode],
        key: &str,
        layer: &str,
        path: &mut Vec<String>,
    ) -> Result<()> {
        for overlay_item in overlay {
            let Some(identity) = identity_of(overlay_item, key) else {
                continue;
            };
            let position = base
                .iter()
                .position(|item| identity_of(item, key) == Some(identity));
            match position {
                Some(index) => {
                    path.push(format!("[{key}={identity}]"));
                    self.merge_into(&mut base[index], overlay_item, layer, path)?;
                    path.pop();
                }
                None => base.push(overlay_item.clone()),
            }
        }
        Ok(())
    }
}

/// Identity value of a list element: a non-null scalar under `key`.
fn identity_of<'n>(item: &'n ConfigNode, key: &str) -> Option<&'n ConfigNode> {
    item.child(key)
        .filter(|value| value.is_scalar() && !value.is_null())
}
