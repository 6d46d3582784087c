//! Task execution layer

pub mod deploy;
pub mod dispatcher;
pub mod undeploy;

use async_trait::async_trait;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::errors::AgentError;
use crate::http::PlatformApi;
use crate::models::task::{Task, TaskStatus};

/// Task types this satellite executes; also the capabilities advertised at
/// pairing time.
pub const SUPPORTED_TASK_TYPES: [&str; 2] = [deploy::TASK_TYPE, undeploy::TASK_TYPE];

/// A handler for one task type
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The task type this handler executes
    fn task_type(&self) -> &'static str;

    /// Execute the task. Domain failures are reported to the platform and
    /// resolved to `Ok(())`; only unexpected errors propagate to the poller's
    /// catch-all.
    async fn run(&self, task: &Task) -> Result<(), AgentError>;
}

/// Best-effort terminal failure report for a task.
///
/// Used on paths where the task must not be silently dropped but the update
/// itself is allowed to fail (the platform will re-offer the task).
pub(crate) async fn report_task_failed(
    platform: &dyn PlatformApi,
    task_id: Uuid,
    reason: &str,
) {
    let result = json!({ "reason": reason });
    if let Err(e) = platform
        .update_task_status(task_id, TaskStatus::Failed, Some(result))
        .await
    {
        error!("Failed to report task {} as failed: {}", task_id, e);
    }
}
