use std::error::Error;
use std::fmt;

use rusqlite::Connection;

use crate::db::{self, SwapOutcome};
use crate::domain::task::{TaskPatch, TaskRecord};

/// Keyed persistence for task records.
///
/// Every method is its own unit of atomicity. `swap` is the only
/// multi-statement operation: it either replaces `old_id` with
/// `replacement` or leaves the store untouched.
pub trait TaskStore {
    fn get(&self, id: &str) -> Result<Option<TaskRecord>, StoreError>;
    fn upsert(&self, task: &TaskRecord) -> Result<(), StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    fn scan(&self) -> Result<Vec<TaskRecord>, StoreError>;
    fn swap(&self, old_id: &str, replacement: &TaskRecord) -> Result<(), StoreError>;

    fn scan_where<P>(&self, predicate: P) -> Result<Vec<TaskRecord>, StoreError>
    where
        P: Fn(&TaskRecord) -> bool,
        Self: Sized,
    {
        Ok(self.scan()?.into_iter().filter(|task| predicate(task)).collect())
    }

    fn apply_patch(&self, id: &str, patch: &TaskPatch) -> Result<TaskRecord, StoreError> {
        let mut task = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply_to(&mut task);
        self.upsert(&task)?;
        Ok(task)
    }
}

impl TaskStore for Connection {
    fn get(&self, id: &str) -> Result<Option<TaskRecord>, StoreError> {
        Ok(db::get_task(self, id)?)
    }

    fn upsert(&self, task: &TaskRecord) -> Result<(), StoreError> {
        Ok(db::upsert_task(self, task)?)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        if db::delete_task(self, id)? {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    fn scan(&self) -> Result<Vec<TaskRecord>, StoreError> {
        Ok(db::list_tasks(self)?)
    }

    fn swap(&self, old_id: &str, replacement: &TaskRecord) -> Result<(), StoreError> {
        match db::swap_task_identity(self, old_id, replacement)? {
            SwapOutcome::Swapped => Ok(()),
            SwapOutcome::MissingOriginal => Err(StoreError::NotFound(old_id.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Db(rusqlite::Error),
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(err) => write!(f, "database error: {}", err),
            StoreError::NotFound(id) => write!(f, "task '{}' not found in local store", id),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Db(err) => Some(err),
            StoreError::NotFound(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}
