use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    NeedsAction,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 2] = [TaskStatus::NeedsAction, TaskStatus::Completed];

    /// Wire spelling shared by the local table and the remote service.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NeedsAction => "needsAction",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_'], "");
        let status = match normalized.as_str() {
            "needsaction" | "open" | "pending" | "todo" => TaskStatus::NeedsAction,
            "completed" | "done" => TaskStatus::Completed,
            _ => {
                return Err(ParseTaskStatusError {
                    value: value.to_string(),
                });
            }
        };
        Ok(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTaskStatusError {
    value: String,
}

impl fmt::Display for ParseTaskStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid task status '{}': expected one of {}",
            self.value,
            TaskStatus::ALL
                .iter()
                .map(|status| status.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseTaskStatusError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub list_name: String,
    pub due_time: Option<String>,
    pub notes: Option<String>,
    pub status: TaskStatus,
}

impl TaskRecord {
    pub fn is_local_origin(&self) -> bool {
        crate::task_id::is_local_origin(&self.id)
    }
}

/// Field-presence update. `due_time` and `notes` distinguish "leave alone"
/// (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub list_name: Option<String>,
    pub due_time: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.list_name.is_some()
            || self.due_time.is_some()
            || self.notes.is_some()
            || self.status.is_some()
    }

    pub fn apply_to(&self, record: &mut TaskRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(list_name) = &self.list_name {
            record.list_name = list_name.clone();
        }
        if let Some(due_time) = &self.due_time {
            record.due_time = due_time.clone();
        }
        if let Some(notes) = &self.notes {
            record.notes = notes.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}
