use tracing::{info, warn};

use crate::domain::task::{TaskRecord, TaskStatus};
use crate::remote::RemoteTasks;
use crate::store::TaskStore;

use super::lists::ListDirectory;
use super::{CompletionSummary, FailureKind, ItemFailure, PassStatus, SyncEngine, SyncError};

fn is_remote_completed(task: &TaskRecord) -> bool {
    !task.is_local_origin() && task.status.is_completed()
}

impl<S, R> SyncEngine<'_, S, R>
where
    S: TaskStore,
    R: RemoteTasks,
{
    /// Marks remote-known, locally completed tasks as completed remotely.
    /// Read-only with respect to the local store.
    pub fn propagate_completions(&self) -> Result<CompletionSummary, SyncError> {
        let completed = self.store.scan_where(is_remote_completed)?;
        let mut summary = CompletionSummary {
            status: PassStatus::Completed,
            attempted: completed.len() as u64,
            updated: Vec::new(),
            failures: Vec::new(),
        };
        if completed.is_empty() {
            info!("completions: nothing to propagate");
            return Ok(summary);
        }

        let directory = ListDirectory::new(self.remote.list_task_lists()?);
        for task in completed {
            // The remote addresses a task by (list, id), so there is no fallback list here.
            let Some(list) = directory.resolve(&task.list_name) else {
                warn!(id = %task.id, list = %task.list_name, "completions: list not found remotely");
                summary.failures.push(ItemFailure {
                    message: format!("no remote list named '{}'", task.list_name),
                    id: task.id,
                    title: task.title,
                    kind: FailureKind::NoTargetList,
                });
                continue;
            };

            match self
                .remote
                .update_status(list.id, &task.id, TaskStatus::Completed)
            {
                Ok(_) => summary.updated.push(task.id),
                Err(err) if err.is_session_level() => return Err(err.into()),
                Err(err) => {
                    warn!(id = %task.id, error = %err, "completions: update rejected");
                    summary.failures.push(ItemFailure {
                        id: task.id,
                        title: task.title,
                        kind: FailureKind::RemoteApi,
                        message: err.to_string(),
                    });
                }
            }
        }

        summary.status = PassStatus::from_failure_count(summary.failures.len());
        info!(
            updated = summary.updated.len(),
            failed = summary.failures.len(),
            "completions: finished"
        );
        Ok(summary)
    }
}
