//! Undeploy task handler
//!
//! Tears a deployment down: remove the container, delete the remote record,
//! then discard local state and best-effort clean the model cache. Removal
//! is idempotent; a deployment whose container is already gone still
//! undeploys successfully.
//!
//! Known reconciliation gap: when the container was removed but the remote
//! record delete fails, the deployment is left `deletion_failed` with the
//! container gone. A later retry (or operator cleanup) must reconcile; this
//! handler does not hide the divergence.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::local::LocalDeployments;
use crate::errors::AgentError;
use crate::http::PlatformApi;
use crate::models::deployment::DeploymentPatch;
use crate::models::task::{Task, TaskStatus};
use crate::runtime::ContainerRuntime;
use crate::tasks::{report_task_failed, TaskHandler};

pub const TASK_TYPE: &str = "undeploy";

pub const REASON_CONTAINER_REMOVAL: &str = "container removal failed";
pub const REASON_RECORD_DELETE: &str = "deployment delete failed";

/// Handler for `undeploy` tasks
pub struct UndeployTask {
    platform: Arc<dyn PlatformApi>,
    runtime: Arc<dyn ContainerRuntime>,
    local: Arc<LocalDeployments>,
}

impl UndeployTask {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        runtime: Arc<dyn ContainerRuntime>,
        local: Arc<LocalDeployments>,
    ) -> Self {
        Self {
            platform,
            runtime,
            local,
        }
    }

    /// Mark both the deployment and the task failed
    async fn fail(
        &self,
        task: &Task,
        deployment_id: Uuid,
        reason: &str,
        error: String,
    ) -> Result<(), AgentError> {
        warn!("Undeploy of {} failed: {} ({})", deployment_id, reason, error);

        if let Err(e) = self
            .platform
            .update_deployment(
                deployment_id,
                &DeploymentPatch::deletion_failed(reason, Some(error)),
            )
            .await
        {
            warn!(
                "Failed to mark deployment {} as deletion_failed: {}",
                deployment_id, e
            );
        }

        report_task_failed(self.platform.as_ref(), task.id, reason).await;
        Ok(())
    }
}

#[async_trait]
impl TaskHandler for UndeployTask {
    fn task_type(&self) -> &'static str {
        TASK_TYPE
    }

    async fn run(&self, task: &Task) -> Result<(), AgentError> {
        self.platform
            .update_task_status(task.id, TaskStatus::Running, None)
            .await?;

        let deployment_id = match task.deployment_id() {
            Some(id) => id,
            None => {
                report_task_failed(
                    self.platform.as_ref(),
                    task.id,
                    "invalid task payload: missing deployment_id",
                )
                .await;
                return Ok(());
            }
        };

        // 1. Remove the container. On failure the remote record is kept so
        //    the platform can retry the whole undeploy later.
        let (container_removed, artifact_id) =
            match self.runtime.remove_model_container(deployment_id).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    return self
                        .fail(task, deployment_id, REASON_CONTAINER_REMOVAL, e.to_string())
                        .await;
                }
            };

        // 2. Delete the remote record. The container is already gone in this
        //    branch; a failure here leaves the documented inconsistency.
        if let Err(e) = self.platform.delete_deployment(deployment_id).await {
            return self
                .fail(task, deployment_id, REASON_RECORD_DELETE, e.to_string())
                .await;
        }

        // 3. Discard local state and best-effort clean the model cache
        self.local.remove(deployment_id);
        if let Some(artifact_id) = artifact_id {
            match self.runtime.cleanup_model_cache(artifact_id).await {
                Ok(true) => info!("Cleaned cached artifact {}", artifact_id),
                Ok(false) => {}
                Err(e) => warn!("Model cache cleanup for {} failed: {}", artifact_id, e),
            }
        }

        self.platform
            .update_task_status(
                task.id,
                TaskStatus::Done,
                Some(json!({ "container_removed": container_removed })),
            )
            .await?;

        info!(
            "Deployment {} undeployed (container_removed={})",
            deployment_id, container_removed
        );
        Ok(())
    }
}
