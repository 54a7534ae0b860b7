use tracing::{info, warn};

use crate::domain::task::TaskRecord;
use crate::remote::{RemoteTask, RemoteTaskList, RemoteTasks};
use crate::store::TaskStore;
use crate::task_id::is_local_origin;

use super::{FailureKind, ItemFailure, ListFailure, PassStatus, PullSummary, SyncEngine, SyncError};

const UNTITLED: &str = "(untitled)";

impl<S, R> SyncEngine<'_, S, R>
where
    S: TaskStore,
    R: RemoteTasks,
{
    /// Mirrors every remote task into the local store, keyed by remote id.
    ///
    /// All lists are fetched before the first local write, so an auth or
    /// network failure anywhere in the enumeration leaves the store as it was.
    pub fn pull(&self) -> Result<PullSummary, SyncError> {
        let lists = self.remote.list_task_lists()?;
        info!(lists = lists.len(), "pull: enumerated remote task lists");

        let mut fetched: Vec<(RemoteTaskList, Vec<RemoteTask>)> = Vec::with_capacity(lists.len());
        let mut skipped_lists = Vec::new();
        for list in lists {
            match self
                .remote
                .list_tasks(&list.id, self.options.include_completed)
            {
                Ok(tasks) => fetched.push((list, tasks)),
                Err(err) if err.is_session_level() => return Err(err.into()),
                Err(err) => {
                    warn!(list_id = %list.id, list = %list.title, error = %err, "pull: skipping list");
                    skipped_lists.push(ListFailure {
                        list_id: list.id,
                        title: list.title,
                        message: err.to_string(),
                    });
                }
            }
        }

        let lists_seen = (fetched.len() + skipped_lists.len()) as u64;
        let mut pulled = 0u64;
        let mut failures = Vec::new();
        for (list, tasks) in fetched {
            for task in tasks {
                if is_local_origin(&task.id) {
                    warn!(id = %task.id, "pull: remote id collides with the local namespace");
                    failures.push(ItemFailure {
                        id: task.id,
                        title: task.title,
                        kind: FailureKind::ReservedId,
                        message: "remote id uses the reserved local prefix".to_string(),
                    });
                    continue;
                }
                self.store.upsert(&record_from_remote(task, &list.title))?;
                pulled += 1;
            }
        }

        info!(pulled, skipped = skipped_lists.len(), "pull: finished");
        Ok(PullSummary {
            status: PassStatus::from_failure_count(skipped_lists.len() + failures.len()),
            lists_seen,
            pulled,
            skipped_lists,
            failures,
        })
    }
}

pub(super) fn record_from_remote(task: RemoteTask, list_name: &str) -> TaskRecord {
    let title = if task.title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        task.title
    };
    TaskRecord {
        id: task.id,
        title,
        list_name: list_name.to_string(),
        due_time: task.due,
        notes: task.notes,
        status: task.status,
    }
}
