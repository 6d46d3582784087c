//! Task dispatch and handler registry

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::AgentError;
use crate::http::PlatformApi;
use crate::models::task::{task_id_of, Task};
use crate::tasks::{report_task_failed, TaskHandler};

/// Validates incoming task documents and routes them to the registered
/// handler for their type.
pub struct TaskDispatcher {
    platform: Arc<dyn PlatformApi>,
    handlers: HashMap<&'static str, Arc<dyn TaskHandler>>,
}

impl TaskDispatcher {
    pub fn new(platform: Arc<dyn PlatformApi>) -> Self {
        Self {
            platform,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its task type
    pub fn register(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(handler.task_type(), handler);
        self
    }

    /// The registered task types
    pub fn task_types(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Validate a raw task document and delegate it to its handler.
    ///
    /// Validation failures and unknown task types are reported to the
    /// platform as `failed` and resolved to `Ok(())`; the handler is never
    /// invoked for them. Handler errors propagate so the poller's catch-all
    /// keeps per-task-type failure semantics authoritative.
    pub async fn dispatch(&self, raw: &Value) -> Result<(), AgentError> {
        let task: Task = match serde_json::from_value(raw.clone()) {
            Ok(task) => task,
            Err(e) => {
                warn!("Received invalid task payload: {}", e);
                self.report_invalid(raw, &format!("invalid task payload: {}", e))
                    .await;
                return Ok(());
            }
        };

        let handler = match self.handlers.get(task.task_type.as_str()) {
            Some(handler) => handler.clone(),
            None => {
                warn!("Received task {} with unknown type '{}'", task.id, task.task_type);
                report_task_failed(
                    self.platform.as_ref(),
                    task.id,
                    &format!("unknown task type: {}", task.task_type),
                )
                .await;
                return Ok(());
            }
        };

        info!("Dispatching task {} ({})", task.id, task.task_type);
        handler.run(&task).await
    }

    /// Report a task that failed before it could be fully deserialized.
    ///
    /// Falls back to lenient id extraction; when even the id is unusable the
    /// anomaly can only be logged.
    async fn report_invalid(&self, raw: &Value, reason: &str) {
        match task_id_of(raw) {
            Some(task_id) => report_task_failed(self.platform.as_ref(), task_id, reason).await,
            None => error!("Task document has no usable id, cannot report failure: {}", reason),
        }
    }
}
