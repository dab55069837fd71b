//! Property tests for the configuration merger

use proptest::prelude::*;
use stack_config::{ConfigLayer, ConfigMerger, ConfigNode, ConfigTree, Precedence};

fn scalar() -> impl Strategy<Value = ConfigNode> {
    prop_oneof![
        Just(ConfigNode::Null),
        any::<bool>().prop_map(ConfigNode::Bool),
        any::<i64>().prop_map(ConfigNode::Integer),
        "[a-z]{0,6}".prop_map(ConfigNode::String),
    ]
}

fn node() -> impl Strategy<Value = ConfigNode> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(ConfigNode::List),
            prop::collection::btree_map("[a-d]", inner, 0..4).prop_map(ConfigNode::Tree),
        ]
    })
}

fn tree() -> impl Strategy<Value = ConfigTree> {
    prop::collection::btree_map("[a-d]", node(), 0..4)
}

/// A list of trees that all carry a `name` identity drawn from a small pool.
fn named_list() -> impl Strategy<Value = Vec<ConfigNode>> {
    prop::collection::btree_map("[x-z]", any::<i64>(), 1..4).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(name, size)| {
                let mut tree = ConfigTree::new();
                tree.insert("name".into(), ConfigNode::String(name));
                tree.insert("size".into(), ConfigNode::Integer(size));
                ConfigNode::Tree(tree)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_is_deterministic(trees in prop::collection::vec(tree(), 0..5)) {
        let layers: Vec<ConfigLayer> = trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| ConfigLayer::new(Precedence::Project, format!("layer-{i}"), tree))
            .collect();

        let merger = ConfigMerger::new();
        let first = merger.merge(&layers).map(|r| r.to_node());
        let second = merger.merge(&layers).map(|r| r.to_node());

        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "merge outcome differed between runs"),
        }
    }

    #[test]
    fn single_layer_merge_is_identity(tree in tree()) {
        let layer = ConfigLayer::new(Precedence::Defaults, "only", tree.clone());
        let resolved = ConfigMerger::new().merge([&layer]).unwrap();
        prop_assert_eq!(resolved.tree(), &tree);
    }

    #[test]
    fn identity_list_merges_matching_elements(base in named_list(), overlay in named_list()) {
        let merger = ConfigMerger::new();
        let merged = merger
            .merge_nodes(&ConfigNode::List(base.clone()), &ConfigNode::List(overlay.clone()))
            .unwrap();
        let merged = merged.as_list().unwrap();

        for item in base.iter().chain(&overlay) {
            let name = item.child("name").unwrap();
            let in_base = base.iter().find(|b| b.child("name") == Some(name));
            let in_overlay = overlay.iter().find(|o| o.child("name") == Some(name));
            let result = merged.iter().find(|m| m.child("name") == Some(name)).unwrap();

            let expected = match (in_base, in_overlay) {
                (Some(b), Some(o)) => merger.merge_nodes(b, o).unwrap(),
                (Some(b), None) => b.clone(),
                (None, Some(o)) => o.clone(),
                (None, None) => unreachable!(),
            };
            prop_assert_eq!(result, &expected);
        }

        let names: std::collections::BTreeSet<_> = base
            .iter()
            .chain(&overlay)
            .filter_map(|n| n.child("name").and_then(ConfigNode::as_str))
            .collect();
        prop_assert_eq!(merged.len(), names.len());
    }
}
