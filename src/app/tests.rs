use std::path::PathBuf;

use mockito::{Matcher, Server};
use reqwest::Url;
use uuid::Uuid;

use super::{App, AppError, NewTaskInput, TaskEdit};
use crate::config::{ConfigError, SyncConfig};
use crate::domain::task::TaskStatus;
use crate::task_id::display_id;

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("tasksync-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("temp workspace should be creatable");
    root
}

fn open_app(root: &std::path::Path, config: SyncConfig) -> App {
    let db_path = root.join(".tasksync/state.sqlite");
    App::open(db_path.to_str().expect("utf8 path"), config).expect("app should open")
}

fn config_for(server: &Server) -> SyncConfig {
    SyncConfig {
        api_base_url: Url::parse(&server.url()).expect("mock url should parse"),
        access_token: Some("token-123".to_string()),
        ..SyncConfig::default()
    }
}

fn input(title: &str, list: Option<&str>) -> NewTaskInput {
    NewTaskInput {
        title: title.to_string(),
        list_name: list.map(str::to_string),
        ..NewTaskInput::default()
    }
}

#[test]
fn create_task_mints_local_id_and_uses_default_list() {
    let root = unique_workspace();
    let app = open_app(&root, SyncConfig::default());

    let created = app
        .create_task(NewTaskInput {
            title: "  Buy milk ".to_string(),
            due: Some("2026-03-01".to_string()),
            notes: Some("   ".to_string()),
            ..NewTaskInput::default()
        })
        .expect("create should succeed");

    assert!(created.id.starts_with("local-"));
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.list_name, "My Tasks");
    assert_eq!(created.due_time.as_deref(), Some("2026-03-01T00:00:00.000Z"));
    assert_eq!(created.notes, None);
    assert_eq!(created.status, TaskStatus::NeedsAction);
    assert_eq!(app.list_tasks().expect("list should succeed"), vec![created]);
    assert!(root.join(".tasksync/state.sqlite").exists());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn create_task_rejects_blank_title_and_bad_due() {
    let root = unique_workspace();
    let app = open_app(&root, SyncConfig::default());

    assert!(matches!(
        app.create_task(input("  ", None)),
        Err(AppError::InvalidArgument(_))
    ));
    let bad_due = app.create_task(NewTaskInput {
        title: "Plan".to_string(),
        due: Some("someday".to_string()),
        ..NewTaskInput::default()
    });
    assert!(matches!(bad_due, Err(AppError::InvalidDue(_))));
    assert!(app.list_tasks().unwrap().is_empty());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn short_ids_resolve_when_unique() {
    let root = unique_workspace();
    let app = open_app(&root, SyncConfig::default());
    let created = app.create_task(input("Buy milk", Some("Errands"))).unwrap();

    let short = display_id(&created.id).to_string();
    assert_eq!(app.resolve_id(&short).unwrap(), created.id);
    let shown = app
        .show_task(&short)
        .expect("show should succeed")
        .expect("task should exist");
    assert_eq!(shown.id, created.id);
    assert!(app.show_task("nope").unwrap().is_none());
    assert!(matches!(app.resolve_id(" "), Err(AppError::InvalidArgument(_))));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn edit_applies_only_given_fields_and_clears_with_empty_values() {
    let root = unique_workspace();
    let app = open_app(&root, SyncConfig::default());
    let created = app
        .create_task(NewTaskInput {
            title: "Draft".to_string(),
            list_name: Some("Work".to_string()),
            due: Some("2026-03-01".to_string()),
            notes: Some("outline first".to_string()),
        })
        .unwrap();

    let updated = app
        .update_task(
            &created.id,
            TaskEdit {
                title: Some("Draft v2".to_string()),
                due: Some(String::new()),
                list_name: Some("Home".to_string()),
                ..TaskEdit::default()
            },
        )
        .expect("edit should succeed");

    assert_eq!(updated.title, "Draft v2");
    assert_eq!(updated.due_time, None);
    assert_eq!(updated.notes.as_deref(), Some("outline first"));
    assert_eq!(updated.list_name, "Home");

    assert!(matches!(
        app.update_task(&created.id, TaskEdit::default()),
        Err(AppError::InvalidArgument(_))
    ));
    assert!(matches!(
        app.update_task(
            &created.id,
            TaskEdit {
                title: Some(" ".to_string()),
                ..TaskEdit::default()
            }
        ),
        Err(AppError::InvalidArgument(_))
    ));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn complete_and_delete_round_out_the_local_lifecycle() {
    let root = unique_workspace();
    let app = open_app(&root, SyncConfig::default());
    let created = app.create_task(input("Call plumber", None)).unwrap();

    let done = app.complete_task(&created.id).expect("complete should succeed");
    assert_eq!(done.status, TaskStatus::Completed);

    let removed = app.delete_task(&created.id).expect("delete should succeed");
    assert_eq!(removed.id, created.id);
    assert!(matches!(
        app.delete_task(&created.id),
        Err(AppError::NotFound(_))
    ));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn sync_without_token_fails_before_any_network_call() {
    let root = unique_workspace();
    let app = open_app(&root, SyncConfig::default());

    let err = app.sync(false).unwrap_err();
    assert!(matches!(err, AppError::Config(ConfigError::MissingToken)));
    assert!(app.last_sync_at().unwrap().is_none());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn sync_pushes_local_task_and_rejects_list_moves_afterwards() {
    let mut server = Server::new();
    let lists = server
        .mock("GET", "/users/@me/lists")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items":[{"id":"L1","title":"Errands"}]}"#)
        .expect_at_least(1)
        .create();
    let pull_tasks = server
        .mock("GET", "/lists/L1/tasks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items":[]}"#)
        .create();
    let create = server
        .mock("POST", "/lists/L1/tasks")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(serde_json::json!({
            "title": "Buy milk",
            "status": "needsAction"
        })))
        .with_status(200)
        .with_body(r#"{"id":"R9","title":"Buy milk","status":"needsAction"}"#)
        .expect(1)
        .create();

    let root = unique_workspace();
    let app = open_app(&root, config_for(&server));
    let local = app.create_task(input("Buy milk", Some("Errands"))).unwrap();

    let report = app.sync(true).expect("sync should succeed");

    lists.assert();
    pull_tasks.assert();
    create.assert();
    assert!(report.completions.is_none());
    assert_eq!(report.push.pushed.len(), 1);
    assert_eq!(report.push.pushed[0].local_id, local.id);

    let tasks = app.list_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "R9");
    assert!(app.last_sync_at().unwrap().is_some());

    let moved = app.update_task(
        "R9",
        TaskEdit {
            list_name: Some("Work".to_string()),
            ..TaskEdit::default()
        },
    );
    assert!(matches!(moved, Err(AppError::InvalidArgument(_))));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn sync_propagates_completions_before_pulling() {
    let mut server = Server::new();
    server
        .mock("GET", "/users/@me/lists")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items":[{"id":"L2","title":"Work"}]}"#)
        .create();
    let patch = server
        .mock("PATCH", "/lists/L2/tasks/R1")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(serde_json::json!({"status": "completed"})))
        .with_status(200)
        .with_body(r#"{"id":"R1","title":"Report","status":"completed"}"#)
        .expect(1)
        .create();
    server
        .mock("GET", "/lists/L2/tasks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"items":[]}"#)
        .create();

    let root = unique_workspace();
    let app = open_app(&root, config_for(&server));
    crate::db::upsert_task(
        &app.conn,
        &crate::domain::task::TaskRecord {
            id: "R1".to_string(),
            title: "Report".to_string(),
            list_name: "Work".to_string(),
            due_time: None,
            notes: None,
            status: TaskStatus::Completed,
        },
    )
    .unwrap();

    let report = app.sync(false).expect("sync should succeed");

    patch.assert();
    let completions = report.completions.expect("completions should run");
    assert_eq!(completions.updated, vec!["R1"]);
    assert_eq!(report.pull.pulled, 0);
    assert_eq!(report.push.attempted, 0);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn auth_rejection_surfaces_as_sync_error() {
    let mut server = Server::new();
    server
        .mock("GET", "/users/@me/lists")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"error":{"message":"Invalid Credentials"}}"#)
        .create();

    let root = unique_workspace();
    let app = open_app(&root, config_for(&server));

    let err = app.pull().unwrap_err();
    assert!(matches!(
        err,
        AppError::Sync(crate::sync::SyncError::Auth(_))
    ));
    assert!(err.to_string().contains("authentication failed"));
    assert!(app.last_sync_at().unwrap().is_none());

    let _ = std::fs::remove_dir_all(root);
}
