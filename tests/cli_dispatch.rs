use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use mockito::{Matcher, Server};
use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn tasksync(root: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tasksync"));
    command
        .current_dir(root)
        .env_remove("TASKSYNC_DB_PATH")
        .env_remove("TASKSYNC_CONFIG")
        .env_remove("TASKSYNC_ACCESS_TOKEN")
        .env_remove("TASKSYNC_API_BASE_URL")
        .env_remove("TASKSYNC_LOG")
        .env("NO_COLOR", "1");
    command
}

fn run(root: &Path, args: &[&str]) -> Output {
    tasksync(root)
        .args(args)
        .output()
        .expect("tasksync command should run")
}

fn run_against(root: &Path, server: &Server, args: &[&str]) -> Output {
    tasksync(root)
        .env("TASKSYNC_ACCESS_TOKEN", "token-123")
        .env("TASKSYNC_API_BASE_URL", server.url())
        .args(args)
        .output()
        .expect("tasksync command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn add_task(root: &Path, args: &[&str]) -> Value {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    full.push("--json");
    let output = run(root, &full);
    assert_success(&output);
    stdout_json(&output)
}

#[test]
fn add_list_and_show_work_offline() {
    let root = unique_workspace("tasksync-cli-offline");

    let created = add_task(&root, &["Buy milk", "--list", "Errands", "--due", "2026-03-01"]);
    let id = created["id"].as_str().expect("id should be a string").to_string();
    assert!(id.starts_with("local-"));
    assert_eq!(created["due_time"], "2026-03-01T00:00:00.000Z");
    assert!(root.join(".tasksync/state.sqlite").exists());

    let listed = run(&root, &["ls"]);
    assert_success(&listed);
    let text = String::from_utf8_lossy(&listed.stdout);
    assert!(text.contains("Errands"));
    assert!(text.contains("Buy milk"));
    assert!(text.contains("(local)"));
    assert!(text.contains("never synced"));

    let short = id.trim_start_matches("local-");
    let shown = run(&root, &["show", short, "--json"]);
    assert_success(&shown);
    assert_eq!(stdout_json(&shown)["id"], id.as_str());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn done_edit_and_rm_update_the_store() {
    let root = unique_workspace("tasksync-cli-lifecycle");
    let created = add_task(&root, &["Call plumber"]);
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(created["list_name"], "My Tasks");

    assert_success(&run(&root, &["edit", &id, "--notes", "after 5pm"]));
    assert_success(&run(&root, &["done", &id]));

    let open = stdout_json(&run(&root, &["ls", "--json"]));
    assert_eq!(open.as_array().expect("array").len(), 0);
    let all = stdout_json(&run(&root, &["ls", "--all", "--json"]));
    assert_eq!(all[0]["status"], "completed");
    assert_eq!(all[0]["notes"], "after 5pm");

    assert_success(&run(&root, &["rm", &id]));
    let missing = run(&root, &["show", &id]);
    assert_failure(&missing);
    assert!(String::from_utf8_lossy(&missing.stderr).contains("not found"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn edit_without_changes_is_rejected() {
    let root = unique_workspace("tasksync-cli-edit");
    let created = add_task(&root, &["Water plants"]);
    let id = created["id"].as_str().expect("id");

    let output = run(&root, &["edit", id]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least one field"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn today_lists_overdue_tasks() {
    let root = unique_workspace("tasksync-cli-today");
    add_task(&root, &["File taxes", "--due", "2001-04-15"]);
    add_task(&root, &["Someday", "--due", "2999-01-01"]);

    let output = run(&root, &["today"]);
    assert_success(&output);
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("[OVERDUE]"));
    assert!(text.contains("File taxes"));
    assert!(!text.contains("Someday"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn sync_without_token_reports_config_error() {
    let root = unique_workspace("tasksync-cli-notoken");
    let output = run(&root, &["sync"]);
    assert_failure(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: config error"));
    assert!(stderr.contains("TASKSYNC_ACCESS_TOKEN"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn explicit_missing_config_fails() {
    let root = unique_workspace("tasksync-cli-config");
    let output = run(&root, &["--config", "nope.toml", "ls"]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.toml"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn sync_pulls_remote_tasks_and_pushes_local_ones() {
    let mut server = Server::new();
    server
        .mock("GET", "/users/@me/lists")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer token-123")
        .with_status(200)
        .with_body(r#"{"items":[{"id":"L1","title":"Errands"},{"id":"L2","title":"Work"}]}"#)
        .create();
    server
        .mock("GET", "/lists/L1/tasks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items":[]}"#)
        .create();
    server
        .mock("GET", "/lists/L2/tasks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items":[{"id":"R1","title":"Report","status":"needsAction"}]}"#)
        .create();
    let create = server
        .mock("POST", "/lists/L1/tasks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id":"R9","title":"Buy milk","status":"needsAction"}"#)
        .expect(1)
        .create();

    let root = unique_workspace("tasksync-cli-sync");
    add_task(&root, &["Buy milk", "--list", "Errands"]);

    let output = run_against(&root, &server, &["sync", "--json"]);
    assert_success(&output);
    create.assert();
    let report = stdout_json(&output);
    assert_eq!(report["pull"]["pulled"], 1);
    assert_eq!(report["pull"]["status"], "completed");
    assert_eq!(report["push"]["pushed"][0]["remote_id"], "R9");
    assert_eq!(report["completions"]["attempted"], 0);

    let listed = stdout_json(&run(&root, &["ls", "--json"]));
    let mut ids = listed
        .as_array()
        .expect("array")
        .iter()
        .map(|task| task["id"].as_str().expect("id").to_string())
        .collect::<Vec<_>>();
    ids.sort();
    assert_eq!(ids, vec!["R1", "R9"]);

    let text = String::from_utf8_lossy(&run(&root, &["ls"]).stdout).to_string();
    assert!(text.contains("last sync:"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn network_failure_leaves_local_tasks_and_prints_hint() {
    let root = unique_workspace("tasksync-cli-offline-sync");
    add_task(&root, &["Buy milk"]);

    let output = tasksync(&root)
        .env("TASKSYNC_ACCESS_TOKEN", "token-123")
        .env("TASKSYNC_API_BASE_URL", "http://127.0.0.1:9")
        .args(["push"])
        .output()
        .expect("tasksync command should run");
    assert_failure(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("network unavailable"));
    assert!(stderr.contains("retry later"));

    let listed = stdout_json(&run(&root, &["ls", "--local", "--json"]));
    assert_eq!(listed.as_array().expect("array").len(), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn completions_print_a_script() {
    let root = unique_workspace("tasksync-cli-completions");
    let output = run(&root, &["completions", "bash"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("tasksync"));
    assert!(!root.join(".tasksync").exists());

    let _ = std::fs::remove_dir_all(root);
}
