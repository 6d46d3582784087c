//! Satgent - Entry Point
//!
//! A satellite worker agent for model-serving deployments. Polls the
//! control plane for tasks, runs health-checked model containers and
//! proxies inference traffic to them.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use satgent::app::options::{AppOptions, ServerOptions, StorageOptions};
use satgent::app::run::run;
use satgent::installer::pair::pair;
use satgent::logs::{init_logging, LogOptions};
use satgent::runtime::RuntimeOptions;
use satgent::storage::layout::StorageLayout;
use satgent::storage::satellite::assert_paired;
use satgent::storage::settings::Settings;
use satgent::tasks::deploy::DeployOptions;
use satgent::utils::version_info;
use satgent::workers::poller;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(v) => println!("{}", v),
            Err(e) => eprintln!("Failed to serialize version info: {}", e),
        }
        return;
    }

    // Run the installer
    if cli_args.contains_key("pair") {
        return pair(&cli_args).await;
    }

    // Run the agent starting here

    // Check the satellite has been paired
    let layout = StorageLayout::default();
    let satellite_file = layout.satellite_file();
    if let Err(e) = assert_paired(&satellite_file).await {
        error!("Satellite is not yet paired: {}", e);
        error!("Run: satgent --pair --token=<pairing_token>");
        return;
    }

    // Retrieve the settings file
    let settings_file = layout.settings_file();
    let settings = match settings_file.read_json::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            error!("Unable to read settings file: {}", e);
            return;
        }
    };

    // Initialize logging; the guard must outlive the run loop
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        log_dir: settings
            .log_to_file
            .then(|| layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Run the agent
    let options = AppOptions {
        platform_base_url: settings.platform.base_url.clone(),
        storage: StorageOptions { layout },
        enable_server: settings.enable_server,
        enable_poller: settings.enable_poller,
        server: ServerOptions {
            host: settings.server.host.clone(),
            port: settings.server.port,
        },
        poller: poller::Options {
            interval: Duration::from_secs(settings.poll_interval_secs),
            ..Default::default()
        },
        secrets_refresh_interval: Duration::from_secs(settings.secrets_refresh_secs),
        runtime: RuntimeOptions {
            network: settings.runtime.network.clone(),
            model_cache_volume: settings.runtime.model_cache_volume.clone(),
            cleanup_image: settings.runtime.cleanup_image.clone(),
        },
        deploy: DeployOptions {
            model_server_image: settings.deploy.model_server_image.clone(),
            internal_port: settings.deploy.internal_port,
            health_attempts: settings.deploy.health_attempts,
            agent_url: settings.deploy.agent_url.clone(),
            ..Default::default()
        },
        ..Default::default()
    };

    info!("Running satgent with options: {:?}", options);
    let result = run(version.version, options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the agent: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to install SIGINT handler: {}", e);
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}
