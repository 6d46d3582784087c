//! Application state management

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::app::options::AppOptions;
use crate::cache::local::LocalDeployments;
use crate::cache::secrets::SecretsCache;
use crate::errors::AgentError;
use crate::http::client::PlatformClient;
use crate::http::PlatformApi;
use crate::mserver::{ModelServerFactory, NetworkModelServers};
use crate::runtime::docker::DockerRuntime;
use crate::runtime::ContainerRuntime;
use crate::storage::satellite::load_satellite;
use crate::tasks::deploy::DeployTask;
use crate::tasks::dispatcher::TaskDispatcher;
use crate::tasks::undeploy::UndeployTask;

/// Main application state
pub struct AppState {
    /// Platform API client
    pub platform: Arc<dyn PlatformApi>,

    /// Container runtime
    pub runtime: Arc<dyn ContainerRuntime>,

    /// Orbit secrets cache
    pub secrets: Arc<SecretsCache>,

    /// Local deployment records
    pub local: Arc<LocalDeployments>,

    /// Model server client factory
    pub mservers: Arc<dyn ModelServerFactory>,

    /// Task dispatcher with the handler registry
    pub dispatcher: Arc<TaskDispatcher>,
}

impl AppState {
    /// Initialize application state
    pub async fn init(options: &AppOptions) -> Result<Arc<Self>, AgentError> {
        info!("Initializing application state...");

        // Load the satellite identity persisted at pairing time
        let satellite_file = options.storage.layout.satellite_file();
        let identity = load_satellite(&satellite_file).await?;
        info!("Running as satellite {} ({})", identity.name, identity.id);

        let platform: Arc<dyn PlatformApi> = Arc::new(
            PlatformClient::new(&options.platform_base_url, &identity.api_key)?
                .with_satellite_id(identity.id),
        );

        // Container engine; the private network must exist before any
        // deploy task runs
        let runtime = DockerRuntime::connect(options.runtime.clone())?;
        runtime.ensure_network().await?;
        let runtime: Arc<dyn ContainerRuntime> = Arc::new(runtime);

        let secrets = SecretsCache::new(platform.clone(), options.secrets_refresh_interval);
        secrets.initialize().await?;

        let local = Arc::new(LocalDeployments::new());
        let mservers: Arc<dyn ModelServerFactory> =
            Arc::new(NetworkModelServers::new(options.deploy.internal_port));

        let dispatcher = Arc::new(
            TaskDispatcher::new(platform.clone())
                .register(Arc::new(DeployTask::new(
                    platform.clone(),
                    runtime.clone(),
                    secrets.clone(),
                    mservers.clone(),
                    local.clone(),
                    options.deploy.clone(),
                )))
                .register(Arc::new(UndeployTask::new(
                    platform.clone(),
                    runtime.clone(),
                    local.clone(),
                ))),
        );

        Ok(Arc::new(Self {
            platform,
            runtime,
            secrets,
            local,
            mservers,
            dispatcher,
        }))
    }

    /// Shutdown application state
    pub async fn shutdown(&self, grace: Duration) -> Result<(), AgentError> {
        info!("Shutting down application state...");
        tokio::time::timeout(grace, self.secrets.shutdown())
            .await
            .map_err(|_| AgentError::ShutdownError("secrets cache shutdown timed out".to_string()))?
    }
}
