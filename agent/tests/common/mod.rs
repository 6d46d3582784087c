//! Shared test doubles: platform and runtime mocks plus an in-process
//! model-server stub standing in for deployed containers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use uuid::Uuid;

use satgent::errors::AgentError;
use satgent::http::PlatformApi;
use satgent::models::deployment::{Deployment, DeploymentPatch, DeploymentStatus};
use satgent::models::secret::Secret;
use satgent::models::task::{Task, TaskStatus};
use satgent::mserver::{ModelServerClient, ModelServerFactory};
use satgent::runtime::{ContainerRuntime, RunContainerSpec};
use satgent::tasks::TaskHandler;

// ================================ FIXTURES ===================================== //

/// A raw task document as the platform would deliver it
pub fn task_doc(task_type: &str, deployment_id: Uuid) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "satellite_id": Uuid::new_v4(),
        "orbit_id": Uuid::new_v4(),
        "type": task_type,
        "payload": { "deployment_id": deployment_id },
        "status": "pending",
        "scheduled_at": Utc::now().to_rfc3339(),
    })
}

/// Parse a raw task document into a `Task`
pub fn parse_task(raw: &Value) -> Task {
    serde_json::from_value(raw.clone()).unwrap()
}

pub fn make_deployment(id: Uuid, artifact_id: Uuid) -> Deployment {
    Deployment {
        id,
        orbit_id: Uuid::new_v4(),
        satellite_id: Uuid::new_v4(),
        artifact_id,
        name: "test-model".to_string(),
        status: DeploymentStatus::Pending,
        inference_url: None,
        env_variables: HashMap::new(),
        env_variables_secrets: HashMap::new(),
        dynamic_attributes_secrets: HashMap::new(),
        schemas: None,
        error_message: None,
    }
}

pub fn make_secret(id: Uuid, name: &str, value: &str) -> Secret {
    serde_json::from_value(json!({ "id": id, "name": name, "value": value })).unwrap()
}

// ============================== MOCK PLATFORM ================================== //

/// In-memory platform mock recording every write
#[derive(Default)]
pub struct MockPlatform {
    /// Pending task documents; drained by `list_tasks`
    pub tasks: Mutex<Vec<Value>>,
    pub deployments: Mutex<HashMap<Uuid, Deployment>>,
    pub secrets: Mutex<HashMap<Uuid, Secret>>,

    pub task_updates: Mutex<Vec<(Uuid, TaskStatus, Option<Value>)>>,
    pub deployment_patches: Mutex<Vec<(Uuid, DeploymentPatch)>>,
    pub deleted_deployments: Mutex<Vec<Uuid>>,

    pub bulk_secret_fetches: AtomicUsize,
    pub single_secret_fetches: AtomicUsize,

    pub fail_list_tasks: AtomicBool,
    pub fail_delete_deployment: AtomicBool,
    pub fail_secret_fetches: AtomicBool,
    pub fail_authorize: AtomicBool,
    pub deny_authorize: AtomicBool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_task(&self, doc: Value) {
        self.tasks.lock().unwrap().push(doc);
    }

    pub fn insert_deployment(&self, deployment: Deployment) {
        self.deployments
            .lock()
            .unwrap()
            .insert(deployment.id, deployment);
    }

    pub fn insert_secret(&self, secret: Secret) {
        self.secrets.lock().unwrap().insert(secret.id, secret);
    }

    /// Statuses recorded for one task, in order
    pub fn statuses_for(&self, task_id: Uuid) -> Vec<TaskStatus> {
        self.task_updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| *id == task_id)
            .map(|(_, status, _)| *status)
            .collect()
    }

    /// The failure reason recorded for a task's `failed` update, if any
    pub fn failure_reason(&self, task_id: Uuid) -> Option<String> {
        self.task_updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, status, _)| *id == task_id && *status == TaskStatus::Failed)
            .and_then(|(_, _, result)| result.clone())
            .and_then(|r| r.get("reason").and_then(|v| v.as_str()).map(String::from))
    }

    /// The last patch recorded for a deployment, if any
    pub fn last_patch(&self, deployment_id: Uuid) -> Option<DeploymentPatch> {
        self.deployment_patches
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| *id == deployment_id)
            .map(|(_, patch)| patch.clone())
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn list_tasks(&self, _status: TaskStatus) -> Result<Vec<Value>, AgentError> {
        if self.fail_list_tasks.load(Ordering::SeqCst) {
            return Err(AgentError::PlatformError("503: unavailable".to_string()));
        }
        Ok(std::mem::take(&mut *self.tasks.lock().unwrap()))
    }

    async fn update_task_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        result: Option<Value>,
    ) -> Result<Task, AgentError> {
        self.task_updates
            .lock()
            .unwrap()
            .push((task_id, status, result.clone()));
        Ok(Task {
            id: task_id,
            satellite_id: Uuid::new_v4(),
            orbit_id: Uuid::new_v4(),
            task_type: "deploy".to_string(),
            payload: serde_json::Map::new(),
            status,
            scheduled_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result,
        })
    }

    async fn get_deployment(&self, id: Uuid) -> Result<Deployment, AgentError> {
        self.deployments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("deployment {}", id)))
    }

    async fn update_deployment(
        &self,
        id: Uuid,
        patch: &DeploymentPatch,
    ) -> Result<Deployment, AgentError> {
        self.deployment_patches
            .lock()
            .unwrap()
            .push((id, patch.clone()));
        self.deployments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("deployment {}", id)))
    }

    async fn delete_deployment(&self, id: Uuid) -> Result<(), AgentError> {
        if self.fail_delete_deployment.load(Ordering::SeqCst) {
            return Err(AgentError::PlatformError("503: unavailable".to_string()));
        }
        self.deleted_deployments.lock().unwrap().push(id);
        self.deployments.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn get_orbit_secret(&self, id: Uuid) -> Result<Secret, AgentError> {
        self.single_secret_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_secret_fetches.load(Ordering::SeqCst) {
            return Err(AgentError::PlatformError("503: unavailable".to_string()));
        }
        self.secrets
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("secret {}", id)))
    }

    async fn get_orbit_secrets(&self) -> Result<Vec<Secret>, AgentError> {
        self.bulk_secret_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_secret_fetches.load(Ordering::SeqCst) {
            return Err(AgentError::PlatformError("503: unavailable".to_string()));
        }
        Ok(self.secrets.lock().unwrap().values().cloned().collect())
    }

    async fn authorize_inference_access(&self, _api_key: &str) -> Result<bool, AgentError> {
        if self.fail_authorize.load(Ordering::SeqCst) {
            return Err(AgentError::PlatformError("503: unavailable".to_string()));
        }
        Ok(!self.deny_authorize.load(Ordering::SeqCst))
    }
}

// =============================== MOCK RUNTIME ================================== //

/// Container runtime mock; no Docker daemon involved
pub struct MockRuntime {
    pub run_specs: Mutex<Vec<RunContainerSpec>>,
    pub removed: Mutex<Vec<Uuid>>,
    pub cleanups: Mutex<Vec<Uuid>>,

    /// What `remove_model_container` reports
    pub remove_result: Mutex<(bool, Option<Uuid>)>,

    pub fail_run: AtomicBool,
    pub fail_remove: AtomicBool,
    pub in_use: AtomicBool,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self {
            run_specs: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            cleanups: Mutex::new(Vec::new()),
            remove_result: Mutex::new((true, None)),
            fail_run: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            in_use: AtomicBool::new(false),
        }
    }
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remove_result(&self, removed: bool, artifact_id: Option<Uuid>) {
        *self.remove_result.lock().unwrap() = (removed, artifact_id);
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn run_model_container(&self, spec: RunContainerSpec) -> Result<(), AgentError> {
        if self.fail_run.load(Ordering::SeqCst) {
            return Err(AgentError::RuntimeError("image pull failed".to_string()));
        }
        self.run_specs.lock().unwrap().push(spec);
        Ok(())
    }

    async fn remove_model_container(
        &self,
        deployment_id: Uuid,
    ) -> Result<(bool, Option<Uuid>), AgentError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(AgentError::RuntimeError("engine unavailable".to_string()));
        }
        self.removed.lock().unwrap().push(deployment_id);
        Ok(*self.remove_result.lock().unwrap())
    }

    async fn is_model_in_use(&self, _artifact_id: Uuid) -> Result<bool, AgentError> {
        Ok(self.in_use.load(Ordering::SeqCst))
    }

    async fn cleanup_model_cache(&self, artifact_id: Uuid) -> Result<bool, AgentError> {
        if self.in_use.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.cleanups.lock().unwrap().push(artifact_id);
        Ok(true)
    }
}

// ============================ MODEL SERVER STUB ================================ //

/// In-process model server standing in for a deployed container
pub struct StubModelServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for StubModelServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a stub model server on an ephemeral port.
///
/// When `healthy` is false, `/healthz` answers 503 and `/compute` 500.
pub async fn spawn_model_server(healthy: bool) -> StubModelServer {
    let app = Router::new()
        .route(
            "/healthz",
            get(move || async move {
                if healthy {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            }),
        )
        .route(
            "/openapi.json",
            get(|| async { Json(json!({"openapi": "3.1.0", "paths": {"/compute": {}}})) }),
        )
        .route(
            "/manifest",
            get(|| async { Json(json!({"model": "stub", "revision": 1})) }),
        )
        .route(
            "/compute",
            post(move |Json(body): Json<Value>| async move {
                if healthy {
                    Ok(Json(json!({"echo": body})))
                } else {
                    Err(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubModelServer {
        base_url: format!("http://{}", addr),
        handle,
    }
}

/// Factory routing every deployment to one stub server
pub struct StubFactory {
    pub base_url: String,
}

impl ModelServerFactory for StubFactory {
    fn client_for(&self, _deployment_id: Uuid) -> ModelServerClient {
        ModelServerClient::with_base_url(self.base_url.clone())
    }
}

// ============================ RECORDING HANDLER ================================ //

/// Task handler recording every run; optionally errors for one task id
pub struct RecordingHandler {
    task_type: &'static str,
    pub runs: Mutex<Vec<Uuid>>,
    pub fail_for: Mutex<Option<Uuid>>,
}

impl RecordingHandler {
    pub fn new(task_type: &'static str) -> Self {
        Self {
            task_type,
            runs: Mutex::new(Vec::new()),
            fail_for: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TaskHandler for RecordingHandler {
    fn task_type(&self) -> &'static str {
        self.task_type
    }

    async fn run(&self, task: &Task) -> Result<(), AgentError> {
        self.runs.lock().unwrap().push(task.id);
        if *self.fail_for.lock().unwrap() == Some(task.id) {
            return Err(AgentError::Internal("handler exploded".to_string()));
        }
        Ok(())
    }
}
