//! Deploy task handler
//!
//! Drives a deployment to `active`: resolve secrets, start (or replace) the
//! model container, poll its health endpoint, fetch schema metadata and
//! report the outcome. A failed step transitions straight to the failed
//! outcome; an already-started container is left running for diagnostics and
//! is only removed by a later explicit undeploy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::local::{LocalDeployment, LocalDeployments};
use crate::cache::secrets::SecretsCache;
use crate::errors::AgentError;
use crate::http::PlatformApi;
use crate::models::deployment::{Deployment, DeploymentPatch};
use crate::models::task::{Task, TaskStatus};
use crate::mserver::ModelServerFactory;
use crate::runtime::{container_name, ContainerRuntime, RunContainerSpec, ARTIFACT_LABEL};
use crate::tasks::{report_task_failed, TaskHandler};

pub const TASK_TYPE: &str = "deploy";

/// Failure reasons surfaced in `error_message.reason`, kept distinct so
/// operators can tell causes apart.
pub const REASON_SECRET_RESOLUTION: &str = "secret resolution failed";
pub const REASON_CONTAINER_START: &str = "container start failed";
pub const REASON_HEALTH_CHECK: &str = "health check failed";

/// Deploy handler options
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Model server image started for each deployment
    pub model_server_image: String,

    /// Port the model server listens on inside the container
    pub internal_port: u16,

    /// Health probe budget
    pub health_attempts: u32,

    /// Spacing between health probes
    pub probe_interval: Duration,

    /// Base URL under which deployed containers can reach this agent
    pub agent_url: String,

    /// Restart policy applied to model containers
    pub restart_policy: Option<String>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            model_server_image: "satgent/model-server:latest".to_string(),
            internal_port: 8000,
            health_attempts: 120,
            probe_interval: Duration::from_secs(1),
            agent_url: "http://host.docker.internal:8080".to_string(),
            restart_policy: Some("unless-stopped".to_string()),
        }
    }
}

/// Handler for `deploy` tasks
pub struct DeployTask {
    platform: Arc<dyn PlatformApi>,
    runtime: Arc<dyn ContainerRuntime>,
    secrets: Arc<SecretsCache>,
    mservers: Arc<dyn ModelServerFactory>,
    local: Arc<LocalDeployments>,
    options: DeployOptions,
}

impl DeployTask {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        runtime: Arc<dyn ContainerRuntime>,
        secrets: Arc<SecretsCache>,
        mservers: Arc<dyn ModelServerFactory>,
        local: Arc<LocalDeployments>,
        options: DeployOptions,
    ) -> Self {
        Self {
            platform,
            runtime,
            secrets,
            mservers,
            local,
            options,
        }
    }

    /// Resolve a map of secret references to plaintext values.
    ///
    /// Fails on the first unresolvable reference, naming it.
    async fn resolve_secrets(
        &self,
        refs: &HashMap<String, Uuid>,
    ) -> Result<HashMap<String, String>, String> {
        let mut resolved = HashMap::with_capacity(refs.len());
        for (name, secret_id) in refs {
            match self.secrets.get_secret(*secret_id).await {
                Some(secret) => {
                    resolved.insert(name.clone(), secret.expose().to_string());
                }
                None => return Err(format!("{} ({})", name, secret_id)),
            }
        }
        Ok(resolved)
    }

    /// Mark both the deployment and the task failed with a distinct reason
    async fn fail(
        &self,
        task: &Task,
        deployment_id: Uuid,
        reason: &str,
        error: Option<String>,
    ) -> Result<(), AgentError> {
        warn!(
            "Deploy of {} failed: {} ({})",
            deployment_id,
            reason,
            error.as_deref().unwrap_or("-")
        );

        if let Err(e) = self
            .platform
            .update_deployment(deployment_id, &DeploymentPatch::failed(reason, error))
            .await
        {
            warn!("Failed to mark deployment {} as failed: {}", deployment_id, e);
        }

        report_task_failed(self.platform.as_ref(), task.id, reason).await;
        Ok(())
    }

    fn inference_url(&self, deployment_id: Uuid) -> String {
        format!(
            "http://{}:{}",
            container_name(deployment_id),
            self.options.internal_port
        )
    }
}

/// Merge the container environment.
///
/// Precedence (lowest to highest): runtime-discovery base, the deployment's
/// plain `env_variables`, resolved secret values.
pub fn build_env(
    deployment: &Deployment,
    secret_env: HashMap<String, String>,
    options: &DeployOptions,
) -> HashMap<String, String> {
    let mut env = HashMap::from([
        ("SATGENT_URL".to_string(), options.agent_url.clone()),
        (
            "SATGENT_DEPLOYMENT_ID".to_string(),
            deployment.id.to_string(),
        ),
        (
            "SATGENT_ARTIFACT_ID".to_string(),
            deployment.artifact_id.to_string(),
        ),
        ("SATGENT_MODELS_DIR".to_string(), "/models".to_string()),
    ]);
    env.extend(deployment.env_variables.clone());
    env.extend(secret_env);
    env
}

#[async_trait]
impl TaskHandler for DeployTask {
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

        let deployment = self.platform.get_deployment(deployment_id).await?;

        // 1. Resolve secret references
        let secret_env = match self.resolve_secrets(&deployment.env_variables_secrets).await {
            Ok(env) => env,
            Err(unresolved) => {
                return self
                    .fail(task, deployment_id, REASON_SECRET_RESOLUTION, Some(unresolved))
                    .await;
            }
        };
        let dynamic_attributes = match self
            .resolve_secrets(&deployment.dynamic_attributes_secrets)
            .await
        {
            Ok(attrs) => attrs,
            Err(unresolved) => {
                return self
                    .fail(task, deployment_id, REASON_SECRET_RESOLUTION, Some(unresolved))
                    .await;
            }
        };

        // 2. Start (or replace) the model container
        let spec = RunContainerSpec {
            name: container_name(deployment_id),
            image: self.options.model_server_image.clone(),
            internal_port: self.options.internal_port,
            labels: HashMap::from([(
                ARTIFACT_LABEL.to_string(),
                deployment.artifact_id.to_string(),
            )]),
            env: build_env(&deployment, secret_env, &self.options),
            restart_policy: self.options.restart_policy.clone(),
        };
        if let Err(e) = self.runtime.run_model_container(spec).await {
            return self
                .fail(task, deployment_id, REASON_CONTAINER_START, Some(e.to_string()))
                .await;
        }

        // 3. Poll the health endpoint with the fixed budget
        let client = self.mservers.client_for(deployment_id);
        if !client
            .is_healthy(self.options.health_attempts, self.options.probe_interval)
            .await
        {
            // The container stays up for diagnostics
            return self
                .fail(
                    task,
                    deployment_id,
                    REASON_HEALTH_CHECK,
                    Some(format!(
                        "no healthy response within {} probes",
                        self.options.health_attempts
                    )),
                )
                .await;
        }

        // 4. Best-effort metadata fetch; None degrades to null in `schemas`
        let openapi_schema = client.get_openapi_schema().await;
        let manifest = client.get_manifest().await;
        let schemas: Value = json!({
            "openapi": openapi_schema.clone(),
            "manifest": manifest.clone(),
        });

        self.local.insert(LocalDeployment {
            deployment_id,
            dynamic_attributes,
            manifest,
            openapi_schema,
        });

        // 5. Report success; a failure here propagates and the platform
        //    re-offers the task, which redeploys idempotently.
        let inference_url = self.inference_url(deployment_id);
        self.platform
            .update_deployment(
                deployment_id,
                &DeploymentPatch::active(inference_url.clone(), schemas),
            )
            .await?;
        self.platform
            .update_task_status(
                task.id,
                TaskStatus::Done,
                Some(json!({
                    "deployment_id": deployment_id,
                    "inference_url": inference_url,
                })),
            )
            .await?;

        info!("Deployment {} is active at {}", deployment_id, inference_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deployment::DeploymentStatus;

    fn test_deployment(env: HashMap<String, String>) -> Deployment {
        Deployment {
            id: Uuid::new_v4(),
            orbit_id: Uuid::new_v4(),
            satellite_id: Uuid::new_v4(),
            artifact_id: Uuid::new_v4(),
            name: "test".to_string(),
            status: DeploymentStatus::Pending,
            inference_url: None,
            env_variables: env,
            env_variables_secrets: HashMap::new(),
            dynamic_attributes_secrets: HashMap::new(),
            schemas: None,
            error_message: None,
        }
    }

    #[test]
    fn test_env_merge_precedence() {
        let deployment = test_deployment(HashMap::from([
            ("SATGENT_URL".to_string(), "plain-wins".to_string()),
            ("DB_HOST".to_string(), "db".to_string()),
            ("TOKEN".to_string(), "plain".to_string()),
        ]));
        let secret_env = HashMap::from([("TOKEN".to_string(), "secret-wins".to_string())]);

        let env = build_env(&deployment, secret_env, &DeployOptions::default());

        // plain env overrides the discovery base, secrets override plain env
        assert_eq!(env["SATGENT_URL"], "plain-wins");
        assert_eq!(env["TOKEN"], "secret-wins");
        assert_eq!(env["DB_HOST"], "db");
        assert_eq!(env["SATGENT_MODELS_DIR"], "/models");
        assert_eq!(env["SATGENT_DEPLOYMENT_ID"], deployment.id.to_string());
    }
}
