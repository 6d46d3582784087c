//! Task models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A unit of work queued by the platform for this satellite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Satellite this task is addressed to
    pub satellite_id: Uuid,

    /// Orbit the task belongs to
    pub orbit_id: Uuid,

    /// Task type: 'deploy' or 'undeploy'
    #[serde(rename = "type")]
    pub task_type: String,

    /// Task payload (shape depends on the task type)
    #[serde(default)]
    pub payload: serde_json::Map<String, Value>,

    /// Current status
    pub status: TaskStatus,

    /// When the platform scheduled the task
    pub scheduled_at: DateTime<Utc>,

    /// When the satellite started executing it
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Outcome payload set by the satellite
    #[serde(default)]
    pub result: Option<Value>,
}

impl Task {
    /// Extract the deployment id from the payload, if present
    pub fn deployment_id(&self) -> Option<Uuid> {
        self.payload
            .get("deployment_id")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }
}

/// Task lifecycle status; `done` and `failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Pull a task id out of a raw task document without full validation.
///
/// Used to report failures for documents that do not deserialize as a `Task`.
pub fn task_id_of(raw: &Value) -> Option<Uuid> {
    raw.get("id")?.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_wire_shape() {
        let raw = json!({
            "id": "7b0d86a0-8986-4f0e-a6e9-1a4d38a87a30",
            "satellite_id": "a3b35f2e-7a4d-4d26-bb31-52f16a24ff8a",
            "orbit_id": "0a2a1987-6e02-44e0-b7c7-9d42d23a9b85",
            "type": "deploy",
            "payload": {"deployment_id": "f4f6b7a8-9c55-4f5f-90c8-4dc5cf24d84f"},
            "status": "pending",
            "scheduled_at": "2026-03-01T12:00:00Z"
        });

        let task: Task = serde_json::from_value(raw).unwrap();
        assert_eq!(task.task_type, "deploy");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.deployment_id().is_some());
        assert!(task.started_at.is_none());
    }

    #[test]
    fn test_task_id_of_lenient() {
        let raw = json!({"id": "7b0d86a0-8986-4f0e-a6e9-1a4d38a87a30", "type": 42});
        assert!(task_id_of(&raw).is_some());
        assert!(task_id_of(&json!({"id": "not-a-uuid"})).is_none());
        assert!(task_id_of(&json!({})).is_none());
    }

    #[test]
    fn test_task_status_display_matches_wire() {
        assert_eq!(TaskStatus::Failed.to_string(), "failed");
        let json = serde_json::to_string(&TaskStatus::Done).unwrap();
        assert_eq!(json, "\"done\"");
    }
}
