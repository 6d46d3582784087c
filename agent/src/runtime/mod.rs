//! Container runtime adapter

pub mod docker;

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AgentError;

/// Label key carrying the artifact id on every model container.
///
/// Used for reverse lookup on removal and for the in-use scan guarding model
/// cache cleanup.
pub const ARTIFACT_LABEL: &str = "io.satgent.artifact-id";

/// Deterministic container name for a deployment.
///
/// Also used by the model server client to reach the container over the
/// private network by name.
pub fn container_name(deployment_id: Uuid) -> String {
    format!("sat-{}", deployment_id)
}

/// Everything needed to start a model container
#[derive(Debug, Clone)]
pub struct RunContainerSpec {
    /// Container name (deterministic, derived from the deployment id)
    pub name: String,

    /// Model server image
    pub image: String,

    /// Port the model server listens on inside the container
    pub internal_port: u16,

    /// Container labels
    pub labels: HashMap<String, String>,

    /// Container environment
    pub env: HashMap<String, String>,

    /// Docker restart policy name (e.g. "unless-stopped")
    pub restart_policy: Option<String>,
}

/// Container runtime options
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Private network the model containers attach to
    pub network: String,

    /// Named volume holding the shared model artifact cache
    pub model_cache_volume: String,

    /// Image used for the short-lived cache cleanup helper
    pub cleanup_image: String,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            network: "satgent".to_string(),
            model_cache_volume: "satgent-models".to_string(),
            cleanup_image: "busybox:stable".to_string(),
        }
    }
}

/// Interface to the container engine
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create or atomically replace a container by name, attach it to the
    /// private network and start it. Replace semantics make redeploy
    /// idempotent.
    async fn run_model_container(&self, spec: RunContainerSpec) -> Result<(), AgentError>;

    /// Stop and force-remove the container for a deployment.
    ///
    /// Returns `(removed, artifact_id)`; an already-gone container is
    /// `(false, None)`, not an error. The artifact id is recovered from the
    /// container's labels before deletion.
    async fn remove_model_container(
        &self,
        deployment_id: Uuid,
    ) -> Result<(bool, Option<Uuid>), AgentError>;

    /// Scan all containers (running and stopped) for the artifact label
    async fn is_model_in_use(&self, artifact_id: Uuid) -> Result<bool, AgentError>;

    /// Delete the cached artifact directory via a short-lived helper
    /// container, unless any container still uses the artifact.
    ///
    /// Returns `true` when the cache entry was deleted, `false` on skip.
    async fn cleanup_model_cache(&self, artifact_id: Uuid) -> Result<bool, AgentError>;
}
