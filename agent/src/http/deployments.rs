//! Deployment API client

use uuid::Uuid;

use crate::errors::AgentError;
use crate::http::client::PlatformClient;
use crate::models::deployment::{Deployment, DeploymentPatch};

impl PlatformClient {
    /// Fetch a deployment record
    pub async fn get_deployment(&self, id: Uuid) -> Result<Deployment, AgentError> {
        let path = format!("/deployments/{}", id);
        self.get(&path).await
    }

    /// Patch the agent-writable deployment fields
    pub async fn update_deployment(
        &self,
        id: Uuid,
        patch: &DeploymentPatch,
    ) -> Result<Deployment, AgentError> {
        let path = format!("/deployments/{}", id);
        self.patch(&path, patch).await
    }

    /// Delete a deployment record
    pub async fn delete_deployment(&self, id: Uuid) -> Result<(), AgentError> {
        let path = format!("/deployments/{}", id);
        self.delete(&path).await
    }
}
