//! Application configuration options

use std::time::Duration;

use crate::runtime::RuntimeOptions;
use crate::storage::layout::StorageLayout;
use crate::tasks::deploy::DeployOptions;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Platform API base URL
    pub platform_base_url: String,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Enable the inference-facing HTTP server
    pub enable_server: bool,

    /// Enable the task polling worker
    pub enable_poller: bool,

    /// Server configuration
    pub server: ServerOptions,

    /// Poller worker options
    pub poller: poller::Options,

    /// Secrets cache refresh interval
    pub secrets_refresh_interval: Duration,

    /// Container runtime options
    pub runtime: RuntimeOptions,

    /// Deploy handler options
    pub deploy: DeployOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            platform_base_url: "https://api.satgent.io/satellite/v1".to_string(),
            storage: StorageOptions::default(),
            enable_server: true,
            enable_poller: true,
            server: ServerOptions::default(),
            poller: poller::Options::default(),
            secrets_refresh_interval: Duration::from_secs(900),
            runtime: RuntimeOptions::default(),
            deploy: DeployOptions::default(),
        }
    }
}

/// Lifecycle options for the agent
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,
}

/// Inference server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}
