//! Behavioural scenarios for the merge, ordering and deployment contracts.

use pretty_assertions::assert_eq;
use serde_json::json;
use stack_config::{ConfigLayer, ConfigMerger, ConfigNode, Precedence};
use stack_deploy::{DeployContext, DeploymentManager, DeploymentStatus};
use stack_modules::{DependencyResolver, Error as ModuleError, ModuleDescriptor, ModuleRegistry};
use stack_test_utils::modules::{Behavior, Journal, scripted_table};

fn layers(values: Vec<serde_json::Value>) -> Vec<ConfigLayer> {
    values
        .into_iter()
        .zip(Precedence::ALL)
        .map(|(value, precedence)| {
            ConfigLayer::from_node(precedence, precedence.as_str(), ConfigNode::from(value))
        })
        .collect()
}

fn merged(values: Vec<serde_json::Value>) -> serde_json::Value {
    ConfigMerger::new()
        .merge(&layers(values))
        .unwrap()
        .to_node()
        .to_json()
}

#[test]
fn scenario_later_layer_wins_and_trees_union() {
    assert_eq!(
        merged(vec![
            json!({ "region": "us-east-1" }),
            json!({ "region": "us-west-2", "tags": { "env": "prod" } }),
        ]),
        json!({ "region": "us-west-2", "tags": { "env": "prod" } })
    );
}

#[test]
fn scenario_list_merge_by_name() {
    assert_eq!(
        merged(vec![
            json!({ "pools": [{ "name": "x", "size": 1 }] }),
            json!({ "pools": [{ "name": "x", "size": 2 }, { "name": "y", "size": 3 }] }),
        ]),
        json!({ "pools": [{ "name": "x", "size": 2 }, { "name": "y", "size": 3 }] })
    );
}

#[test]
fn scenario_credentials_replaced_wholesale() {
    assert_eq!(
        merged(vec![
            json!({ "provider": { "credentials": { "user": "org", "token": "t-org" } } }),
            json!({ "provider": { "credentials": { "user": "ci" } } }),
        ]),
        json!({ "provider": { "credentials": { "user": "ci" } } })
    );
}

#[test]
fn scenario_chain_orders_dependencies_first() {
    let mut registry = ModuleRegistry::new();
    registry
        .register_all([
            ModuleDescriptor::new("A"),
            ModuleDescriptor::new("B").depends_on(["A"]),
            ModuleDescriptor::new("C").depends_on(["B"]),
        ])
        .unwrap();

    let order = DependencyResolver::new(&registry)
        .order(&["A", "B", "C"])
        .unwrap();
    assert_eq!(order, vec!["A", "B", "C"]);
}

#[test]
fn scenario_two_cycle_is_rejected() {
    let mut registry = ModuleRegistry::new();
    registry
        .register_all([
            ModuleDescriptor::new("A").depends_on(["B"]),
            ModuleDescriptor::new("B").depends_on(["A"]),
        ])
        .unwrap();

    let err = DependencyResolver::new(&registry)
        .order(&["A", "B"])
        .unwrap_err();
    match err {
        ModuleError::CircularDependency { module, cycle } => {
            assert!(module == "A" || module == "B");
            assert!(cycle.contains(&module));
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn scenario_failure_does_not_stop_the_run() {
    let journal = Journal::new();
    let modules = scripted_table(
        &journal,
        &[
            ("a", Behavior::Output(json!(1))),
            ("x", Behavior::Fail("boom".into())),
            ("b", Behavior::Requires(vec!["x".into()])),
            ("c", Behavior::Output(json!(3))),
        ],
    );
    let mut registry = ModuleRegistry::new();
    registry
        .register_all(["a", "x", "b", "c"].map(ModuleDescriptor::new))
        .unwrap();
    let config = ConfigMerger::new().merge(&layers(vec![json!({})])).unwrap();
    let manager = DeploymentManager::new(config, registry, modules, DeployContext::new("test"));

    let order = ["a", "x", "b", "c"];
    let report = manager.deploy_all(&order);

    assert_eq!(journal.entries(), order);
    assert_eq!(report.len(), order.len());
    let statuses: Vec<_> = report.iter().map(|r| (r.module(), r.status())).collect();
    assert_eq!(
        statuses,
        vec![
            ("a", DeploymentStatus::Deployed),
            ("x", DeploymentStatus::Failed),
            ("b", DeploymentStatus::Failed),
            ("c", DeploymentStatus::Deployed),
        ]
    );
}

#[test]
fn scenario_duplicate_registration_rejected() {
    let mut registry = ModuleRegistry::new();
    registry.register(ModuleDescriptor::new("A")).unwrap();
    let err = registry.register(ModuleDescriptor::new("A")).unwrap_err();
    assert!(matches!(err, ModuleError::DuplicateModule { .. }));
}
