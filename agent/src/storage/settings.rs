//! Settings file management

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Write logs to a daily-rolling file under the storage layout
    #[serde(default)]
    pub log_to_file: bool,

    /// Platform configuration
    #[serde(default)]
    pub platform: PlatformSettings,

    /// Enable the inference-facing HTTP server
    #[serde(default = "default_true")]
    pub enable_server: bool,

    /// Enable the task polling worker
    #[serde(default = "default_true")]
    pub enable_poller: bool,

    /// Server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Task polling interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Secrets cache refresh interval in seconds
    #[serde(default = "default_secrets_refresh")]
    pub secrets_refresh_secs: u64,

    /// Container runtime configuration
    #[serde(default)]
    pub runtime: RuntimeSettings,

    /// Deployment configuration
    #[serde(default)]
    pub deploy: DeploySettings,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    10
}

fn default_secrets_refresh() -> u64 {
    900
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_to_file: false,
            platform: PlatformSettings::default(),
            enable_server: true,
            enable_poller: true,
            server: ServerSettings::default(),
            poll_interval_secs: default_poll_interval(),
            secrets_refresh_secs: default_secrets_refresh(),
            runtime: RuntimeSettings::default(),
            deploy: DeploySettings::default(),
        }
    }
}

/// Platform API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Base URL for the platform API
    #[serde(default = "default_platform_url")]
    pub base_url: String,
}

fn default_platform_url() -> String {
    "https://api.satgent.io/satellite/v1".to_string()
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            base_url: default_platform_url(),
        }
    }
}

/// Inference server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Container runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Private network the model containers attach to
    #[serde(default = "default_network")]
    pub network: String,

    /// Named volume holding the shared model artifact cache
    #[serde(default = "default_model_cache_volume")]
    pub model_cache_volume: String,

    /// Image used for the short-lived cache cleanup helper
    #[serde(default = "default_cleanup_image")]
    pub cleanup_image: String,
}

fn default_network() -> String {
    "satgent".to_string()
}

fn default_model_cache_volume() -> String {
    "satgent-models".to_string()
}

fn default_cleanup_image() -> String {
    "busybox:stable".to_string()
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            network: default_network(),
            model_cache_volume: default_model_cache_volume(),
            cleanup_image: default_cleanup_image(),
        }
    }
}

/// Deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Model server image started for each deployment
    #[serde(default = "default_model_server_image")]
    pub model_server_image: String,

    /// Port the model server listens on inside the container
    #[serde(default = "default_internal_port")]
    pub internal_port: u16,

    /// Number of 1-second-spaced health probes before giving up
    #[serde(default = "default_health_attempts")]
    pub health_attempts: u32,

    /// Base URL under which deployed containers can reach this agent
    #[serde(default = "default_agent_url")]
    pub agent_url: String,
}

fn default_model_server_image() -> String {
    "satgent/model-server:latest".to_string()
}

fn default_internal_port() -> u16 {
    8000
}

fn default_health_attempts() -> u32 {
    120
}

fn default_agent_url() -> String {
    "http://host.docker.internal:8080".to_string()
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            model_server_image: default_model_server_image(),
            internal_port: default_internal_port(),
            health_attempts: default_health_attempts(),
            agent_url: default_agent_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(settings.enable_poller);
        assert_eq!(settings.poll_interval_secs, 10);
        assert_eq!(settings.secrets_refresh_secs, 900);
        assert_eq!(settings.deploy.health_attempts, 120);
        assert_eq!(settings.runtime.network, "satgent");
    }
}
