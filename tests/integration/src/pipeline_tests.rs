//! End-to-end runs: files on disk -> layers -> plan -> deployment report.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use stack_config::{ConfigNode, ConfigTree};
use stack_deploy::{
    DeploymentManager, DeploymentStatus, FnModule, ModuleOutput, Planner,
};
use stack_modules::ModuleRegistry;
use stack_secrets::{InMemoryBackend, SecretBackend, SecretResolver};
use stack_test_utils::modules::{Behavior, Journal, scripted_table};
use stack_test_utils::project::TestProject;

const CATALOG: &str = r#"
[modules.network]

[modules.cluster]
depends_on = ["network"]

[modules.db]
depends_on = ["network", "iam"]

[modules.app]
depends_on = ["cluster", "db"]

[modules.monitoring]
depends_on = ["cluster"]
enabled = false
"#;

fn project() -> TestProject {
    TestProject::new()
        .with_catalog(CATALOG)
        .with_org_config(
            "region: us-east-1\nnetwork:\n  cidr: 10.0.0.0/16\n  subnets:\n    - name: public\n      size: 24\n",
        )
        .with_project_config(
            r#"
[network]
[[network.subnets]]
name = "private"
size = 20

[db]
engine = "postgres"
size = 1
password = { secure = "s3cr3t" }
"#,
        )
        .with_stack_config(
            "prod",
            r#"
region = "eu-west-1"

[db]
size = 5

[[network.subnets]]
name = "public"
size = 26
"#,
        )
}

#[test]
fn test_full_pipeline_from_files() {
    let project = project();
    let registry = ModuleRegistry::from_catalog(&project.read("modules.toml")).unwrap();
    let store = project
        .loader("prod")
        .with_defaults(
            ConfigNode::from(json!({ "app": { "replicas": 2 } }))
                .into_tree()
                .unwrap(),
        )
        .load()
        .unwrap();

    let plan = Planner::new(&registry).plan(&store).unwrap();
    assert_eq!(plan.order(), ["network", "cluster", "db", "app"]);

    let config = plan.config();
    assert_eq!(config.get("region").and_then(ConfigNode::as_str), Some("eu-west-1"));
    assert_eq!(config.get("app.replicas").and_then(ConfigNode::as_i64), Some(2));
    assert_eq!(config.get("db.size").and_then(ConfigNode::as_i64), Some(5));
    assert!(config.get("db.password").and_then(ConfigNode::as_secret).is_some());

    let subnets = config.module("network").get("subnets").unwrap().to_json();
    assert_eq!(
        subnets,
        json!([
            { "name": "public", "size": 26 },
            { "name": "private", "size": 20 }
        ])
    );

    let journal = Journal::new();
    let modules = scripted_table(
        &journal,
        &[
            ("network", Behavior::Echo),
            ("cluster", Behavior::Requires(vec!["network".into()])),
            ("db", Behavior::Echo),
            ("app", Behavior::Requires(vec!["cluster".into(), "db".into()])),
            ("monitoring", Behavior::Echo),
        ],
    );
    let manager = DeploymentManager::new(
        config.clone(),
        registry.clone(),
        modules,
        plan.context("prod"),
    );
    let report = manager.deploy_all(plan.order());

    assert!(report.is_success());
    assert_eq!(journal.entries(), vec!["network", "cluster", "db", "app"]);
    assert_eq!(journal.count("monitoring"), 0);

    let db_output = report.get("db").unwrap().output().unwrap();
    assert_eq!(db_output["engine"], json!("postgres"));
    assert!(db_output["password"].as_str().unwrap().starts_with("secret://memory/"));
}

#[test]
fn test_same_project_different_stacks() {
    let project = project();
    let registry = ModuleRegistry::from_catalog(&project.read("modules.toml")).unwrap();

    let dev = Planner::new(&registry)
        .plan(&project.loader("dev").load().unwrap())
        .unwrap();
    let prod = Planner::new(&registry)
        .plan(&project.loader("prod").load().unwrap())
        .unwrap();

    assert_eq!(dev.config().get("db.size").and_then(ConfigNode::as_i64), Some(1));
    assert_eq!(prod.config().get("db.size").and_then(ConfigNode::as_i64), Some(5));
    assert_eq!(dev.order(), prod.order());
}

#[test]
fn test_runtime_env_overrides_every_file_layer() {
    let project = project();
    let registry = ModuleRegistry::from_catalog(&project.read("modules.toml")).unwrap();
    let store = project
        .loader("prod")
        .with_env([
            ("STACK_CONFIG__DB__SIZE", "8"),
            ("STACK_CONFIG__MONITORING__ENABLED", "true"),
            ("UNRELATED", "ignored"),
        ])
        .load()
        .unwrap();

    let plan = Planner::new(&registry).plan(&store).unwrap();

    assert_eq!(plan.config().get("db.size").and_then(ConfigNode::as_i64), Some(8));
    assert!(plan.config().get("unrelated").is_none());
    assert_eq!(plan.order(), ["network", "cluster", "db", "app", "monitoring"]);
}

#[derive(Debug, Deserialize, PartialEq)]
struct DbSettings {
    engine: String,
    size: u32,
    #[serde(default)]
    replicas: u32,
}

#[test]
fn test_module_deserializes_typed_settings_and_dereferences_secret() {
    let project = project();
    let registry = ModuleRegistry::from_catalog(&project.read("modules.toml")).unwrap();
    let backend = Arc::new(InMemoryBackend::named("vault-test"));
    let plan = Planner::new(&registry)
        .with_secrets(SecretResolver::new(backend.clone()))
        .plan_for(&project.loader("prod").load().unwrap(), &["db"])
        .unwrap();

    let mut modules = stack_deploy::ModuleTable::new();
    modules
        .register(
            "db",
            FnModule::new(|config, ctx| {
                #[derive(Deserialize)]
                struct Typed {
                    engine: String,
                    size: u32,
                }
                let typed: Typed = config.deserialize()?;
                let handle = config.secret("password").ok_or("password missing")?;
                let password = ctx.secret(handle)?;
                Ok(ModuleOutput::new()
                    .with_message(format!("{} x{}", typed.engine, typed.size))
                    .with_data(json!({ "password_len": password.expose().len() })))
            }),
        )
        .unwrap();

    let manager = DeploymentManager::new(
        plan.config().clone(),
        registry.clone(),
        modules,
        plan.context("prod"),
    );
    let report = manager.deploy_all(plan.order());

    let db = report.get("db").unwrap();
    assert_eq!(db.status(), DeploymentStatus::Deployed);
    assert_eq!(db.message(), "postgres x5");
    assert_eq!(db.output(), Some(&json!({ "password_len": 6 })));
    assert_eq!(backend.name(), "vault-test");
    assert_eq!(backend.len(), 1);

    let settings: DbSettings = plan.config().module("db").deserialize().unwrap();
    assert_eq!(
        settings,
        DbSettings {
            engine: "postgres".into(),
            size: 5,
            replicas: 0
        }
    );
}

#[test]
fn test_rerun_replaces_previous_results() {
    let project = project();
    let registry = ModuleRegistry::from_catalog(&project.read("modules.toml")).unwrap();
    let plan = Planner::new(&registry)
        .plan(&project.loader("prod").load().unwrap())
        .unwrap();

    let journal = Journal::new();
    let modules = scripted_table(
        &journal,
        &[
            ("network", Behavior::Output(json!("net"))),
            ("cluster", Behavior::Requires(vec!["network".into()])),
            ("db", Behavior::Echo),
            ("app", Behavior::Echo),
        ],
    );
    let manager = DeploymentManager::new(
        plan.config().clone(),
        registry.clone(),
        modules,
        plan.context("prod"),
    );

    let first = manager.deploy_all(plan.order());
    let second = manager.deploy_all(&["cluster"]);

    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 1);
    // Outputs from the first run are not visible to the second
    assert!(!second.get("cluster").unwrap().success());
}

#[test]
fn test_empty_project_plans_nothing_but_registered_defaults() {
    let project = TestProject::new().with_catalog("[modules.solo]\n");
    let registry = ModuleRegistry::from_catalog(&project.read("modules.toml")).unwrap();
    let store = project.loader("dev").load().unwrap();

    assert_eq!(store.len(), 1);
    let plan = Planner::new(&registry).plan(&store).unwrap();
    assert_eq!(plan.order(), ["solo"]);
    assert_eq!(plan.config().tree(), &ConfigTree::new());
}
