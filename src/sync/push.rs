use tracing::{error, info, warn};

use crate::domain::task::TaskRecord;
use crate::remote::{NewRemoteTask, RemoteTasks};
use crate::store::{StoreError, TaskStore};
use crate::task_id::is_local_origin;

use super::lists::ListDirectory;
use super::pull::record_from_remote;
use super::{FailureKind, ItemFailure, PassStatus, PushSummary, PushedTask, SyncEngine, SyncError};

enum ItemError {
    Abort(SyncError),
    Failed(FailureKind, String),
}

impl<S, R> SyncEngine<'_, S, R>
where
    S: TaskStore,
    R: RemoteTasks,
{
    /// Creates every local-origin task remotely and migrates it to the
    /// remote id.
    ///
    /// Per-task rejections are collected and the batch continues. Auth,
    /// network and database failures abort the rest of the pass; tasks
    /// already migrated stay migrated.
    pub fn push(&self) -> Result<PushSummary, SyncError> {
        let pending = self.store.scan_where(TaskRecord::is_local_origin)?;
        let mut summary = PushSummary {
            status: PassStatus::Completed,
            attempted: pending.len() as u64,
            pushed: Vec::new(),
            failures: Vec::new(),
        };
        if pending.is_empty() {
            info!("push: no local tasks to push");
            return Ok(summary);
        }

        let directory = ListDirectory::new(self.remote.list_task_lists()?);
        for task in &pending {
            match self.push_one(&directory, task) {
                Ok(pushed) => {
                    info!(local_id = %pushed.local_id, remote_id = %pushed.remote_id, "push: migrated task");
                    summary.pushed.push(pushed);
                }
                Err(ItemError::Failed(kind, message)) => {
                    warn!(id = %task.id, title = %task.title, ?kind, %message, "push: task not pushed");
                    summary.failures.push(ItemFailure {
                        id: task.id.clone(),
                        title: task.title.clone(),
                        kind,
                        message,
                    });
                }
                Err(ItemError::Abort(err)) => return Err(err),
            }
        }

        summary.status = PassStatus::from_failure_count(summary.failures.len());
        info!(
            pushed = summary.pushed.len(),
            failed = summary.failures.len(),
            "push: finished"
        );
        Ok(summary)
    }

    fn push_one(&self, directory: &ListDirectory, task: &TaskRecord) -> Result<PushedTask, ItemError> {
        let target = directory.resolve_or_default(&task.list_name).ok_or_else(|| {
            ItemError::Failed(
                FailureKind::NoTargetList,
                format!(
                    "no remote list named '{}' and the account has no default list",
                    task.list_name
                ),
            )
        })?;

        let request = NewRemoteTask {
            title: task.title.clone(),
            notes: task.notes.clone(),
            status: task.status,
            due: task.due_time.clone(),
        };
        let created = self
            .remote
            .create_task(target.id, &request)
            .map_err(|err| {
                if err.is_session_level() {
                    ItemError::Abort(err.into())
                } else {
                    ItemError::Failed(FailureKind::RemoteApi, err.to_string())
                }
            })?;

        let remote_id = created.id.clone();
        if is_local_origin(&remote_id) {
            // Ids must stay disjoint: a local-prefixed id would be pushed again next pass.
            warn!(local_id = %task.id, %remote_id, "push: remote id collides with the local namespace");
            return Err(ItemError::Failed(
                FailureKind::ReservedId,
                format!(
                    "remote assigned id '{}' with the reserved local prefix; local task left unchanged",
                    remote_id
                ),
            ));
        }
        let replacement = record_from_remote(created, target.title);
        match self.store.swap(&task.id, &replacement) {
            Ok(()) => Ok(PushedTask {
                local_id: task.id.clone(),
                remote_id,
                title: replacement.title,
                list_name: replacement.list_name,
            }),
            Err(StoreError::NotFound(_)) => Err(ItemError::Failed(
                FailureKind::LocalStore,
                format!(
                    "task was removed locally while pushing; remote copy '{}' was kept",
                    remote_id
                ),
            )),
            Err(err) => {
                error!(
                    local_id = %task.id,
                    %remote_id,
                    error = %err,
                    "push: remote task created but local identity swap failed"
                );
                Err(ItemError::Abort(err.into()))
            }
        }
    }
}
