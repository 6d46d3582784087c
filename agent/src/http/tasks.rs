//! Task API client

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AgentError;
use crate::http::client::PlatformClient;
use crate::models::task::{Task, TaskStatus};

/// List of tasks response
#[derive(Debug, Clone, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Value>,
}

#[derive(Debug, Clone, serde::Serialize)]
struct TaskStatusUpdate {
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl PlatformClient {
    /// List this satellite's tasks with the given status.
    ///
    /// Returns raw documents; the dispatcher validates each one on its own so
    /// a single malformed task cannot poison the whole poll cycle.
    pub async fn list_tasks(&self, status: TaskStatus) -> Result<Vec<Value>, AgentError> {
        let satellite_id = self.satellite_id()?;
        let path = format!("/satellites/{}/tasks?status={}", satellite_id, status);
        let response: TaskListResponse = self.get(&path).await?;
        Ok(response.tasks)
    }

    /// Update a task's status
    pub async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        result: Option<Value>,
    ) -> Result<Task, AgentError> {
        let path = format!("/tasks/{}/status", task_id);
        let update = TaskStatusUpdate { status, result };
        self.patch(&path, &update).await
    }
}
