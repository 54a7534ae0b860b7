use std::error::Error;
use std::fmt;

use serde::Serialize;

use crate::remote::{RemoteError, RemoteTasks};
use crate::store::{StoreError, TaskStore};

mod completions;
mod lists;
mod pull;
mod push;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Also mirror remote tasks that are already completed.
    pub include_completed: bool,
}

/// Reconciles a local task store with a remote task service.
///
/// Passes run strictly one call at a time. The caller must not run two
/// engines against the same store concurrently.
pub struct SyncEngine<'a, S, R> {
    store: &'a S,
    remote: &'a R,
    options: SyncOptions,
}

impl<'a, S, R> SyncEngine<'a, S, R>
where
    S: TaskStore,
    R: RemoteTasks,
{
    pub fn new(store: &'a S, remote: &'a R, options: SyncOptions) -> Self {
        Self {
            store,
            remote,
            options,
        }
    }

    /// Pull, then push. Push is skipped only when pull returns an error; a
    /// partial pull still proceeds to push.
    pub fn sync(&self) -> Result<SyncSummary, SyncError> {
        let pull = self.pull()?;
        let push = self.push()?;
        Ok(SyncSummary { pull, push })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Completed,
    Partial,
}

impl PassStatus {
    fn from_failure_count(failures: usize) -> Self {
        if failures == 0 {
            PassStatus::Completed
        } else {
            PassStatus::Partial
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PassStatus::Completed => "completed",
            PassStatus::Partial => "partial",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoTargetList,
    RemoteApi,
    LocalStore,
    ReservedId,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: String,
    pub title: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListFailure {
    pub list_id: String,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PullSummary {
    pub status: PassStatus,
    pub lists_seen: u64,
    pub pulled: u64,
    pub skipped_lists: Vec<ListFailure>,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushedTask {
    pub local_id: String,
    pub remote_id: String,
    pub title: String,
    pub list_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushSummary {
    pub status: PassStatus,
    pub attempted: u64,
    pub pushed: Vec<PushedTask>,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletionSummary {
    pub status: PassStatus,
    pub attempted: u64,
    pub updated: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncSummary {
    pub pull: PullSummary,
    pub push: PushSummary,
}

/// Pass-level failure. Anything returned here aborted the pass.
#[derive(Debug)]
pub enum SyncError {
    Auth(RemoteError),
    Network(RemoteError),
    Remote(RemoteError),
    Store(StoreError),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network(_))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Auth(err) => write!(f, "authentication failed: {}", err),
            SyncError::Network(err) => write!(f, "network unavailable: {}", err),
            SyncError::Remote(err) => write!(f, "remote service error: {}", err),
            SyncError::Store(err) => write!(f, "local store error: {}", err),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncError::Auth(err) => Some(err),
            SyncError::Network(err) => Some(err),
            SyncError::Remote(err) => Some(err),
            SyncError::Store(err) => Some(err),
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(value: RemoteError) -> Self {
        if value.is_auth() {
            SyncError::Auth(value)
        } else if value.is_transient() {
            SyncError::Network(value)
        } else {
            SyncError::Remote(value)
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        SyncError::Store(value)
    }
}
