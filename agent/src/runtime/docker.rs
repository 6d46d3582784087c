//! Docker-backed container runtime

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StopContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, RestartPolicy, RestartPolicyNameEnum};
use bollard::network::CreateNetworkOptions;
use bollard::Docker;
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AgentError;
use crate::runtime::{
    container_name, ContainerRuntime, RunContainerSpec, RuntimeOptions, ARTIFACT_LABEL,
};

/// Grace period before a container is killed on stop
const STOP_GRACE_SECS: i64 = 10;

/// Container runtime backed by the Docker Engine API
pub struct DockerRuntime {
    docker: Docker,
    options: RuntimeOptions,
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn is_conflict(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 409,
            ..
        }
    )
}

fn restart_policy_from(name: &str) -> Option<RestartPolicy> {
    let name = match name {
        "always" => RestartPolicyNameEnum::ALWAYS,
        "unless-stopped" => RestartPolicyNameEnum::UNLESS_STOPPED,
        "on-failure" => RestartPolicyNameEnum::ON_FAILURE,
        "no" => RestartPolicyNameEnum::NO,
        other => {
            warn!("Unknown restart policy '{}', ignoring", other);
            return None;
        }
    };
    Some(RestartPolicy {
        name: Some(name),
        maximum_retry_count: None,
    })
}

impl DockerRuntime {
    /// Connect to the local Docker daemon
    pub fn connect(options: RuntimeOptions) -> Result<Self, AgentError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker, options })
    }

    /// Create the private model network, tolerating it already existing
    pub async fn ensure_network(&self) -> Result<(), AgentError> {
        let result = self
            .docker
            .create_network(CreateNetworkOptions {
                name: self.options.network.clone(),
                ..Default::default()
            })
            .await;

        match result {
            Ok(_) => {
                info!("Created model network '{}'", self.options.network);
                Ok(())
            }
            Err(e) if is_conflict(&e) => {
                debug!("Model network '{}' already exists", self.options.network);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Force-remove a container by name, tolerating it being absent
    async fn remove_if_exists(&self, name: &str) -> Result<bool, AgentError> {
        let result = self
            .docker
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Pull an image unless it is already present locally
    async fn ensure_image(&self, image: &str) -> Result<(), AgentError> {
        match self.docker.inspect_image(image).await {
            Ok(_) => return Ok(()),
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(e.into()),
        }

        info!("Pulling image '{}'...", image);
        let mut pull = self.docker.create_image(
            Some(CreateImageOptions {
                from_image: image.to_string(),
                ..Default::default()
            }),
            None,
            None,
        );
        while let Some(progress) = pull.next().await {
            progress?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn run_model_container(&self, spec: RunContainerSpec) -> Result<(), AgentError> {
        // Replace semantics: drop any existing holder of the name first
        if self.remove_if_exists(&spec.name).await? {
            info!("Replaced existing container '{}'", spec.name);
        }

        let env: Vec<String> = spec
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let host_config = HostConfig {
            network_mode: Some(self.options.network.clone()),
            binds: Some(vec![format!(
                "{}:/models",
                self.options.model_cache_volume
            )]),
            restart_policy: spec
                .restart_policy
                .as_deref()
                .and_then(restart_policy_from),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(env),
            labels: Some(spec.labels.clone()),
            host_config: Some(host_config),
            ..Default::default()
        };

        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: spec.name.clone(),
                    platform: None,
                }),
                config,
            )
            .await?;

        self.docker
            .start_container::<String>(&spec.name, None)
            .await?;

        info!(
            "Started model container '{}' (image '{}', port {})",
            spec.name, spec.image, spec.internal_port
        );
        Ok(())
    }

    async fn remove_model_container(
        &self,
        deployment_id: Uuid,
    ) -> Result<(bool, Option<Uuid>), AgentError> {
        let name = container_name(deployment_id);

        // Inspect first to recover the artifact id before deletion
        let inspect = match self.docker.inspect_container(&name, None).await {
            Ok(info) => info,
            Err(e) if is_not_found(&e) => {
                debug!("Container '{}' already gone", name);
                return Ok((false, None));
            }
            Err(e) => return Err(e.into()),
        };

        let artifact_id = inspect
            .config
            .and_then(|c| c.labels)
            .and_then(|labels| labels.get(ARTIFACT_LABEL).cloned())
            .and_then(|v| v.parse().ok());

        if let Err(e) = self
            .docker
            .stop_container(&name, Some(StopContainerOptions { t: STOP_GRACE_SECS }))
            .await
        {
            warn!("Failed to stop container '{}': {}", name, e);
        }

        self.docker
            .remove_container(
                &name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;

        info!("Removed model container '{}'", name);
        Ok((true, artifact_id))
    }

    async fn is_model_in_use(&self, artifact_id: Uuid) -> Result<bool, AgentError> {
        let mut filters = HashMap::new();
        filters.insert(
            "label".to_string(),
            vec![format!("{}={}", ARTIFACT_LABEL, artifact_id)],
        );

        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters,
                ..Default::default()
            }))
            .await?;

        Ok(!containers.is_empty())
    }

    async fn cleanup_model_cache(&self, artifact_id: Uuid) -> Result<bool, AgentError> {
        if self.is_model_in_use(artifact_id).await? {
            debug!(
                "Artifact {} still in use, skipping cache cleanup",
                artifact_id
            );
            return Ok(false);
        }

        self.ensure_image(&self.options.cleanup_image).await?;

        let helper_name = format!("sat-cleanup-{}", artifact_id);
        self.remove_if_exists(&helper_name).await?;

        let config = Config {
            image: Some(self.options.cleanup_image.clone()),
            cmd: Some(vec![
                "rm".to_string(),
                "-rf".to_string(),
                format!("/models/{}", artifact_id),
            ]),
            host_config: Some(HostConfig {
                binds: Some(vec![format!(
                    "{}:/models",
                    self.options.model_cache_volume
                )]),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: helper_name.clone(),
                    platform: None,
                }),
                config,
            )
            .await?;
        self.docker
            .start_container::<String>(&helper_name, None)
            .await?;

        let mut wait = self
            .docker
            .wait_container(&helper_name, None::<WaitContainerOptions<String>>);
        let exit_code = match wait.next().await {
            Some(Ok(response)) => response.status_code,
            Some(Err(DockerError::DockerContainerWaitError { code, .. })) => code,
            Some(Err(e)) => {
                let _ = self.remove_if_exists(&helper_name).await;
                return Err(e.into());
            }
            None => 0,
        };

        self.remove_if_exists(&helper_name).await?;

        if exit_code != 0 {
            return Err(AgentError::RuntimeError(format!(
                "cache cleanup for artifact {} exited with code {}",
                artifact_id, exit_code
            )));
        }

        info!("Deleted cached artifact {}", artifact_id);
        Ok(true)
    }
}
