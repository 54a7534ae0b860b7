use std::error::Error;
use std::fmt;

use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::config::{ConfigError, SyncConfig};
use crate::db;
use crate::domain::task::{TaskPatch, TaskRecord, TaskStatus};
use crate::listing::{self, InvalidDue};
use crate::remote::{GoogleTasksClient, RemoteError};
use crate::store::{StoreError, TaskStore};
use crate::sync::{
    CompletionSummary, PullSummary, PushSummary, SyncEngine, SyncError, SyncOptions,
};
use crate::task_id::{display_id, generate_local_id, is_local_origin};

const LAST_SYNC_META_KEY: &str = "last_sync_at";

pub struct App {
    conn: Connection,
    config: SyncConfig,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskInput {
    pub title: String,
    pub list_name: Option<String>,
    pub due: Option<String>,
    pub notes: Option<String>,
}

/// Command-level edit. Empty `due`/`notes` strings clear the field.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub list_name: Option<String>,
    pub due: Option<String>,
    pub notes: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub completions: Option<CompletionSummary>,
    pub pull: PullSummary,
    pub push: PushSummary,
}

impl App {
    pub fn open(db_path: &str, config: SyncConfig) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        Ok(Self { conn, config })
    }

    pub fn create_task(&self, input: NewTaskInput) -> Result<TaskRecord, AppError> {
        let title = non_empty(&input.title)
            .ok_or_else(|| AppError::InvalidArgument("title cannot be empty".to_string()))?;
        let list_name = input
            .list_name
            .as_deref()
            .and_then(non_empty)
            .unwrap_or_else(|| self.config.default_list_name.clone());
        let due_time = match input.due.as_deref().and_then(non_empty) {
            Some(raw) => Some(listing::normalize_due(&raw, listing::today_utc())?),
            None => None,
        };

        let id = generate_local_id(|candidate| {
            matches!(db::get_task(&self.conn, candidate), Ok(Some(_)))
        });
        let task = TaskRecord {
            id,
            title,
            list_name,
            due_time,
            notes: input.notes.as_deref().and_then(non_empty),
            status: TaskStatus::NeedsAction,
        };
        self.conn.upsert(&task)?;
        info!(id = %task.id, list = %task.list_name, "created local task");
        Ok(task)
    }

    pub fn list_tasks(&self) -> Result<Vec<TaskRecord>, AppError> {
        Ok(self.conn.scan()?)
    }

    pub fn list_names(&self) -> Result<Vec<String>, AppError> {
        Ok(db::distinct_list_names(&self.conn)?)
    }

    pub fn show_task(&self, id: &str) -> Result<Option<TaskRecord>, AppError> {
        match self.resolve_id(id) {
            Ok(full_id) => Ok(self.conn.get(&full_id)?),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Accepts a full id, or the short form printed by `ls` when it is unique.
    pub fn resolve_id(&self, raw: &str) -> Result<String, AppError> {
        let needle = raw.trim();
        if needle.is_empty() {
            return Err(AppError::InvalidArgument("task id cannot be empty".to_string()));
        }
        if self.conn.get(needle)?.is_some() {
            return Ok(needle.to_string());
        }

        let mut matches = self
            .conn
            .scan()?
            .into_iter()
            .filter(|task| display_id(&task.id) == needle || task.id.ends_with(needle))
            .map(|task| task.id)
            .collect::<Vec<_>>();
        match matches.len() {
            0 => Err(AppError::NotFound(needle.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(AppError::InvalidArgument(format!(
                "id '{}' is ambiguous: {}",
                needle,
                matches.join(", ")
            ))),
        }
    }

    pub fn update_task(&self, id: &str, edit: TaskEdit) -> Result<TaskRecord, AppError> {
        let full_id = self.resolve_id(id)?;
        let patch = self.patch_from_edit(&full_id, edit)?;
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "edit requires at least one field change".to_string(),
            ));
        }
        Ok(self.conn.apply_patch(&full_id, &patch)?)
    }

    fn patch_from_edit(&self, id: &str, edit: TaskEdit) -> Result<TaskPatch, AppError> {
        let title = match edit.title.as_deref() {
            Some(raw) => Some(non_empty(raw).ok_or_else(|| {
                AppError::InvalidArgument("title cannot be empty".to_string())
            })?),
            None => None,
        };

        let list_name = match edit.list_name.as_deref() {
            Some(raw) => {
                let name = non_empty(raw).ok_or_else(|| {
                    AppError::InvalidArgument("list name cannot be empty".to_string())
                })?;
                // The remote addresses synced tasks by (list, id).
                if !is_local_origin(id) {
                    return Err(AppError::InvalidArgument(format!(
                        "task '{}' is already synced; its list cannot be changed locally",
                        display_id(id)
                    )));
                }
                Some(name)
            }
            None => None,
        };

        let due_time = match edit.due.as_deref() {
            Some(raw) => match non_empty(raw) {
                Some(value) => Some(Some(listing::normalize_due(&value, listing::today_utc())?)),
                None => Some(None),
            },
            None => None,
        };

        Ok(TaskPatch {
            title,
            list_name,
            due_time,
            notes: edit.notes.as_deref().map(non_empty),
            status: edit.status,
        })
    }

    pub fn complete_task(&self, id: &str) -> Result<TaskRecord, AppError> {
        let full_id = self.resolve_id(id)?;
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            ..TaskPatch::default()
        };
        Ok(self.conn.apply_patch(&full_id, &patch)?)
    }

    pub fn delete_task(&self, id: &str) -> Result<TaskRecord, AppError> {
        let full_id = self.resolve_id(id)?;
        let task = self
            .conn
            .get(&full_id)?
            .ok_or_else(|| AppError::NotFound(full_id.clone()))?;
        self.conn.delete(&full_id)?;
        Ok(task)
    }

    pub fn last_sync_at(&self) -> Result<Option<String>, AppError> {
        Ok(db::get_meta(&self.conn, LAST_SYNC_META_KEY)?)
    }

    pub fn pull(&self) -> Result<PullSummary, AppError> {
        let remote = self.remote()?;
        let summary = self.engine(&remote).pull()?;
        self.record_sync()?;
        Ok(summary)
    }

    pub fn push(&self) -> Result<PushSummary, AppError> {
        let remote = self.remote()?;
        let summary = self.engine(&remote).push()?;
        self.record_sync()?;
        Ok(summary)
    }

    pub fn propagate_completions(&self) -> Result<CompletionSummary, AppError> {
        let remote = self.remote()?;
        Ok(self.engine(&remote).propagate_completions()?)
    }

    /// Completions first, so offline check-offs reach the remote before pull
    /// overwrites the local rows.
    pub fn sync(&self, skip_completions: bool) -> Result<SyncReport, AppError> {
        let remote = self.remote()?;
        let engine = self.engine(&remote);
        let completions = if skip_completions {
            None
        } else {
            Some(engine.propagate_completions()?)
        };
        let summary = engine.sync()?;
        self.record_sync()?;
        Ok(SyncReport {
            completions,
            pull: summary.pull,
            push: summary.push,
        })
    }

    fn remote(&self) -> Result<GoogleTasksClient, AppError> {
        let token = self.config.resolve_access_token()?;
        Ok(GoogleTasksClient::new(
            self.config.api_base_url.clone(),
            token,
            self.config.request_timeout,
        )?)
    }

    fn engine<'a>(
        &'a self,
        remote: &'a GoogleTasksClient,
    ) -> SyncEngine<'a, Connection, GoogleTasksClient> {
        let options = SyncOptions {
            include_completed: self.config.include_completed,
        };
        SyncEngine::new(&self.conn, remote, options)
    }

    fn record_sync(&self) -> Result<(), AppError> {
        db::set_meta(&self.conn, LAST_SYNC_META_KEY, &db::now_utc_rfc3339())?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Store(StoreError),
    Config(ConfigError),
    Remote(RemoteError),
    Sync(SyncError),
    InvalidDue(InvalidDue),
    InvalidArgument(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Db(err) => write!(f, "database error: {}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Config(err) => write!(f, "config error: {}", err),
            AppError::Remote(err) => write!(f, "remote error: {}", err),
            AppError::Sync(err) => write!(f, "sync error: {}", err),
            AppError::InvalidDue(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(id) => write!(f, "task '{}' not found in local store", id),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Db(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Remote(err) => Some(err),
            AppError::Sync(err) => Some(err),
            AppError::InvalidDue(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => AppError::NotFound(id),
            other => AppError::Store(other),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<RemoteError> for AppError {
    fn from(value: RemoteError) -> Self {
        AppError::Remote(value)
    }
}

impl From<SyncError> for AppError {
    fn from(value: SyncError) -> Self {
        AppError::Sync(value)
    }
}

impl From<InvalidDue> for AppError {
    fn from(value: InvalidDue) -> Self {
        AppError::InvalidDue(value)
    }
}

#[cfg(test)]
mod tests;
