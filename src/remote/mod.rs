use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::task::TaskStatus;

mod google;

pub use google::{GoogleTasksClient, DEFAULT_BASE_URL};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteTaskList {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
}

fn default_status() -> TaskStatus {
    TaskStatus::NeedsAction
}

/// Body of a task creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRemoteTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
}

/// The remote task service as the reconciliation engine sees it.
pub trait RemoteTasks {
    fn list_task_lists(&self) -> Result<Vec<RemoteTaskList>, RemoteError>;

    fn list_tasks(
        &self,
        list_id: &str,
        include_completed: bool,
    ) -> Result<Vec<RemoteTask>, RemoteError>;

    fn create_task(&self, list_id: &str, task: &NewRemoteTask) -> Result<RemoteTask, RemoteError>;

    fn update_status(
        &self,
        list_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<RemoteTask, RemoteError>;
}

#[derive(Debug)]
pub enum RemoteError {
    Auth { status: u16, message: String },
    Network(String),
    Api { status: u16, message: String },
    Decode(String),
}

impl RemoteError {
    /// Credentials were refused; nothing else in this session will succeed.
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Auth { .. })
    }

    /// The service could not be reached; safe to retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Network(_))
    }

    /// Errors that poison the whole session rather than one request.
    pub fn is_session_level(&self) -> bool {
        self.is_auth() || self.is_transient()
    }

    pub(crate) fn from_status(status: u16, body: String) -> Self {
        let lower = body.to_ascii_lowercase();
        let throttled = lower.contains("ratelimit") || lower.contains("quota");
        if status == 401 || (status == 403 && !throttled) {
            RemoteError::Auth {
                status,
                message: body,
            }
        } else {
            RemoteError::Api {
                status,
                message: body,
            }
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Auth { status, message } => {
                write!(f, "authorization rejected (HTTP {}): {}", status, message)
            }
            RemoteError::Network(message) => write!(f, "remote unreachable: {}", message),
            RemoteError::Api { status, message } => {
                write!(f, "remote API error (HTTP {}): {}", status, message)
            }
            RemoteError::Decode(message) => {
                write!(f, "remote response could not be decoded: {}", message)
            }
        }
    }
}

impl Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            RemoteError::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            RemoteError::from_status(status.as_u16(), value.to_string())
        } else {
            RemoteError::Network(value.to_string())
        }
    }
}
