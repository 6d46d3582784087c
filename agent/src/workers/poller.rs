//! Task polling worker
//!
//! The outermost loop of the task engine: every interval, fetch the pending
//! tasks for this satellite and feed them to the dispatcher one at a time.
//! Sequential dispatch is deliberate; a single stuck task delays the rest of
//! the tick until its internal timeout elapses, in exchange for a trivially
//! predictable failure model.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::http::PlatformApi;
use crate::models::task::{task_id_of, TaskStatus};
use crate::tasks::dispatcher::TaskDispatcher;
use crate::tasks::report_task_failed;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before first poll
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Run the poller worker.
///
/// Shutdown is honored between iterations only; an in-flight tick always
/// runs to completion.
pub async fn run<S, F>(
    options: &Options,
    platform: Arc<dyn PlatformApi>,
    dispatcher: Arc<TaskDispatcher>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with poll
            }
        }

        tick(platform.as_ref(), dispatcher.as_ref()).await;
    }
}

/// One poll cycle: fetch pending tasks and dispatch them in order.
///
/// A dispatch error is confined to its task: it is logged, best-effort
/// reported as `failed`, and the cycle moves on to the next task.
pub async fn tick(platform: &dyn PlatformApi, dispatcher: &TaskDispatcher) {
    debug!("Polling for pending tasks...");

    let tasks = match platform.list_tasks(TaskStatus::Pending).await {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Failed to fetch pending tasks: {}", e);
            return;
        }
    };

    if !tasks.is_empty() {
        info!("Received {} pending task(s)", tasks.len());
    }

    for raw in &tasks {
        if let Err(e) = dispatcher.dispatch(raw).await {
            error!("Task execution failed: {}", e);
            if let Some(task_id) = task_id_of(raw) {
                report_task_failed(platform, task_id, &e.to_string()).await;
            }
        }
    }
}
