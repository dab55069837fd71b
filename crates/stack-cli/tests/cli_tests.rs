//! CLI end-to-end tests that invoke the compiled `stack` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use stack_test_utils::project::TestProject;

const CATALOG: &str = r#"
[modules.network]

[modules.cluster]
depends_on = ["network"]

[modules.db]
depends_on = ["network"]

[modules.monitoring]
depends_on = ["cluster"]
enabled = false
"#;

/// Get a Command for the stack binary, isolated from the user environment
fn stack_cmd(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("stack").expect("Failed to find stack binary");
    cmd.env("NO_COLOR", "1")
        .env("STACK_ORG_DIR", project.org_dir())
        .env_remove("STACK_NAME")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is not JSON")
}

fn layered_project() -> TestProject {
    TestProject::new()
        .with_org_config("region: us-east-1\nowner: platform\n")
        .with_project_config("region = \"us-east-2\"\n\n[db]\nsize = 1\nengine = \"pg\"\n")
        .with_stack_config("prod", "[db]\nsize = 5\n")
        .with_catalog(CATALOG)
}

// ============================================================================
// General
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let project = TestProject::new();
    stack_cmd(&project)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("modules"));
}

#[test]
fn test_missing_command_fails() {
    let project = TestProject::new();
    stack_cmd(&project).assert().failure();
}

// ============================================================================
// resolve
// ============================================================================

#[test]
fn test_resolve_merges_layers_in_precedence_order() {
    let project = layered_project();
    stack_cmd(&project)
        .arg("resolve")
        .arg("--root")
        .arg(project.root())
        .args(["--stack", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("region = \"us-east-2\""))
        .stdout(predicate::str::contains("owner = \"platform\""))
        .stdout(predicate::str::contains("db.size = 5"))
        .stdout(predicate::str::contains("db.engine = \"pg\""));
}

#[test]
fn test_resolve_module_slice_as_json() {
    let project = layered_project();
    let value = stdout_json(
        stack_cmd(&project)
            .arg("resolve")
            .arg("--root")
            .arg(project.root())
            .args(["--stack", "prod", "--module", "db", "--json"]),
    );
    assert_eq!(value, json!({ "size": 5, "engine": "pg" }));
}

#[test]
fn test_resolve_other_stack_ignores_prod_overrides() {
    let project = layered_project();
    let value = stdout_json(
        stack_cmd(&project)
            .arg("resolve")
            .arg("--root")
            .arg(project.root())
            .args(["--stack", "dev", "--module", "db", "--json"]),
    );
    assert_eq!(value["size"], json!(1));
}

#[test]
fn test_resolve_runtime_override_from_env() {
    let project = layered_project();
    let value = stdout_json(
        stack_cmd(&project)
            .env("STACK_CONFIG__DB__SIZE", "9")
            .arg("resolve")
            .arg("--root")
            .arg(project.root())
            .args(["--stack", "prod", "--json"]),
    );
    assert_eq!(value["db"]["size"], json!(9));
    assert_eq!(value["region"], json!("us-east-2"));
}

#[test]
fn test_resolve_never_prints_secure_plaintext() {
    let project = TestProject::new()
        .with_project_config("[db]\npassword = { secure = \"hunter2\" }\n");
    stack_cmd(&project)
        .arg("resolve")
        .arg("--root")
        .arg(project.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("secret://memory/"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_resolve_merge_conflict_fails() {
    let project = TestProject::new()
        .with_project_config("[db]\nsize = 3\n")
        .with_stack_config("prod", "[db.size]\nmin = 1\n");
    stack_cmd(&project)
        .arg("resolve")
        .arg("--root")
        .arg(project.root())
        .args(["--stack", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Merge conflict"))
        .stderr(predicate::str::contains("db.size"));
}

#[test]
fn test_resolve_invalid_root() {
    let project = TestProject::new();
    stack_cmd(&project)
        .args(["resolve", "--root", "/nonexistent/stack-project"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}

// ============================================================================
// plan
// ============================================================================

#[test]
fn test_plan_orders_enabled_modules() {
    let project = layered_project();
    stack_cmd(&project)
        .arg("plan")
        .arg("--root")
        .arg(project.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("1. network"))
        .stdout(predicate::str::contains("2. cluster"))
        .stdout(predicate::str::contains("3. db"))
        .stdout(predicate::str::contains("Disabled: monitoring"));
}

#[test]
fn test_plan_json_honors_enable_override() {
    let project = layered_project().with_stack_config("prod", "[monitoring]\nenabled = true\n\n[db]\nenabled = false\n");
    let value = stdout_json(
        stack_cmd(&project)
            .arg("plan")
            .arg("--root")
            .arg(project.root())
            .args(["--stack", "prod", "--json"]),
    );

    assert_eq!(value["order"], json!(["network", "cluster", "monitoring"]));
    assert_eq!(value["levels"], json!([["network"], ["cluster"], ["monitoring"]]));
    assert_eq!(value["disabled"], json!(["db"]));
}

#[test]
fn test_plan_cycle_fails_before_anything_runs() {
    let project = TestProject::new().with_catalog(
        "[modules.a]\ndepends_on = [\"b\"]\n\n[modules.b]\ndepends_on = [\"a\"]\n",
    );
    stack_cmd(&project)
        .arg("plan")
        .arg("--root")
        .arg(project.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular dependency"))
        .stderr(predicate::str::contains("a -> b -> a"));
}

#[test]
fn test_plan_missing_catalog() {
    let project = TestProject::new();
    stack_cmd(&project)
        .arg("plan")
        .arg("--root")
        .arg(project.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("modules.toml"));
}

// ============================================================================
// modules
// ============================================================================

#[test]
fn test_modules_lists_catalog() {
    let project = TestProject::new().with_catalog(CATALOG);
    stack_cmd(&project)
        .arg("modules")
        .arg("--catalog")
        .arg(project.catalog_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cluster"))
        .stdout(predicate::str::contains("disabled"))
        .stdout(predicate::str::contains("Total: 4 modules"));
}

#[test]
fn test_modules_invalid_catalog() {
    let project = TestProject::new().with_catalog("[modules.a]\ndepends_on = 3\n");
    stack_cmd(&project)
        .arg("modules")
        .arg("--catalog")
        .arg(project.catalog_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse module catalog"));
}
