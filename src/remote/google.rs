use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{NewRemoteTask, RemoteError, RemoteTask, RemoteTaskList, RemoteTasks};
use crate::domain::task::TaskStatus;

pub const DEFAULT_BASE_URL: &str = "https://tasks.googleapis.com/tasks/v1";
const PAGE_SIZE: &str = "100";

/// Google Tasks REST v1 binding.
pub struct GoogleTasksClient {
    base_url: Url,
    access_token: String,
    client: Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl GoogleTasksClient {
    pub fn new(base_url: Url, access_token: String, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tasksync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url,
            access_token,
            client,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                RemoteError::Network(format!("base url '{}' cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request.bearer_auth(&self.access_token).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), body));
        }
        let text = response.text()?;
        serde_json::from_str(&text).map_err(|err| RemoteError::Decode(err.to_string()))
    }

    fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, RemoteError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(url.clone())
                .query(query)
                .query(&[("maxResults", PAGE_SIZE)]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let page: Page<T> = self.execute(request)?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(items)
    }
}

impl RemoteTasks for GoogleTasksClient {
    fn list_task_lists(&self) -> Result<Vec<RemoteTaskList>, RemoteError> {
        let url = self.url(&["users", "@me", "lists"])?;
        debug!(%url, "listing task lists");
        self.get_all_pages(url, &[])
    }

    fn list_tasks(
        &self,
        list_id: &str,
        include_completed: bool,
    ) -> Result<Vec<RemoteTask>, RemoteError> {
        let url = self.url(&["lists", list_id, "tasks"])?;
        debug!(%url, include_completed, "listing tasks");
        let flag = if include_completed { "true" } else { "false" };
        self.get_all_pages(url, &[("showCompleted", flag), ("showHidden", flag)])
    }

    fn create_task(&self, list_id: &str, task: &NewRemoteTask) -> Result<RemoteTask, RemoteError> {
        let url = self.url(&["lists", list_id, "tasks"])?;
        debug!(%url, title = %task.title, "creating task");
        self.execute(self.client.post(url).json(task))
    }

    fn update_status(
        &self,
        list_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<RemoteTask, RemoteError> {
        let url = self.url(&["lists", list_id, "tasks", task_id])?;
        debug!(%url, %status, "updating task status");
        let body = match status {
            TaskStatus::Completed => json!({ "status": status }),
            TaskStatus::NeedsAction => json!({ "status": status, "completed": null }),
        };
        self.execute(self.client.patch(url).json(&body))
    }
}
