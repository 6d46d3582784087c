//! Platform HTTP client

pub mod client;
pub mod deployments;
pub mod pairing;
pub mod secrets;
pub mod tasks;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AgentError;
use crate::models::deployment::{Deployment, DeploymentPatch};
use crate::models::secret::Secret;
use crate::models::task::{Task, TaskStatus};

/// Narrow platform interface consumed by the task layer.
///
/// Implemented by `PlatformClient` against the real control plane and by
/// mocks in tests.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// List this satellite's tasks with the given status, as raw documents
    /// so each one can be validated independently.
    async fn list_tasks(&self, status: TaskStatus) -> Result<Vec<Value>, AgentError>;

    /// Update a task's status, optionally attaching a result payload.
    async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        result: Option<Value>,
    ) -> Result<Task, AgentError>;

    /// Fetch a deployment record.
    async fn get_deployment(&self, id: Uuid) -> Result<Deployment, AgentError>;

    /// Patch the agent-writable deployment fields.
    async fn update_deployment(
        &self,
        id: Uuid,
        patch: &DeploymentPatch,
    ) -> Result<Deployment, AgentError>;

    /// Delete a deployment record.
    async fn delete_deployment(&self, id: Uuid) -> Result<(), AgentError>;

    /// Fetch a single orbit secret by id.
    async fn get_orbit_secret(&self, id: Uuid) -> Result<Secret, AgentError>;

    /// Fetch all orbit secrets visible to this satellite.
    async fn get_orbit_secrets(&self) -> Result<Vec<Secret>, AgentError>;

    /// Check whether an API key is allowed to call inference endpoints.
    async fn authorize_inference_access(&self, api_key: &str) -> Result<bool, AgentError>;
}

#[async_trait]
impl PlatformApi for client::PlatformClient {
    async fn list_tasks(&self, status: TaskStatus) -> Result<Vec<Value>, AgentError> {
        self.list_tasks(status).await
    }

    async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        result: Option<Value>,
    ) -> Result<Task, AgentError> {
        self.update_task_status(task_id, status, result).await
    }

    async fn get_deployment(&self, id: Uuid) -> Result<Deployment, AgentError> {
        self.get_deployment(id).await
    }

    async fn update_deployment(
        &self,
        id: Uuid,
        patch: &DeploymentPatch,
    ) -> Result<Deployment, AgentError> {
        self.update_deployment(id, patch).await
    }

    async fn delete_deployment(&self, id: Uuid) -> Result<(), AgentError> {
        self.delete_deployment(id).await
    }

    async fn get_orbit_secret(&self, id: Uuid) -> Result<Secret, AgentError> {
        self.get_orbit_secret(id).await
    }

    async fn get_orbit_secrets(&self) -> Result<Vec<Secret>, AgentError> {
        self.get_orbit_secrets().await
    }

    async fn authorize_inference_access(&self, api_key: &str) -> Result<bool, AgentError> {
        self.authorize_inference_access(api_key).await
    }
}
