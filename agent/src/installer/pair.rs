//! Satellite pairing

use std::collections::HashMap;

use tracing::{error, info};

use crate::http::client::PlatformClient;
use crate::logs::{init_logging, LogOptions};
use crate::models::capability::capabilities_payload;
use crate::storage::layout::StorageLayout;
use crate::storage::satellite::{save_satellite, SatelliteIdentity};
use crate::storage::settings::Settings;
use crate::tasks::SUPPORTED_TASK_TYPES;
use crate::utils::version_info;

/// Run the pairing process
pub async fn pair(cli_args: &HashMap<String, String>) {
    match pair_impl(cli_args).await {
        Ok(_) => {
            info!("Pairing successful");
            println!("\n[SUCCESS] Satellite paired successfully!");
            println!("Start the agent with: systemctl start satgent");
        }
        Err(e) => {
            error!("Pairing failed: {:?}", e);
            eprintln!("\n[ERROR] Pairing failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn pair_impl(cli_args: &HashMap<String, String>) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize temporary logging
    let log_options = LogOptions {
        stdout: true,
        ..Default::default()
    };
    let _ = init_logging(log_options);

    println!("Satgent Installer");
    println!("=================");
    println!();

    // Get pairing token
    let token_env_var = "SATGENT_PAIRING_TOKEN";
    let pairing_token = cli_args
        .get("token")
        .cloned()
        .or_else(|| std::env::var(token_env_var).ok())
        .ok_or_else(|| {
            format!(
                "Missing pairing token. Provide via --token=<token> or {} environment variable",
                token_env_var
            )
        })?;

    // Get satellite slug
    let slug = cli_args
        .get("slug")
        .cloned()
        .or_else(get_hostname)
        .unwrap_or_else(|| "satgent".to_string());
    println!("Satellite slug: {}", slug);
    println!();

    // Setup storage layout
    let layout = StorageLayout::default();
    println!("Setting up storage at: {:?}", layout.base_dir);
    layout.setup().await?;

    // Platform URL from args or default
    let platform_url = cli_args
        .get("platform")
        .cloned()
        .unwrap_or_else(|| Settings::default().platform.base_url);
    println!("Platform URL: {}", platform_url);

    // Base URL under which deployed containers reach this agent
    let agent_url = cli_args
        .get("base-url")
        .cloned()
        .unwrap_or_else(|| Settings::default().deploy.agent_url);
    println!("Agent URL: {}", agent_url);
    println!();

    // Pair with the platform, advertising the supported task types
    println!("Pairing satellite...");
    let version = version_info();
    let capabilities = capabilities_payload(&SUPPORTED_TASK_TYPES, &version.version);

    let client = PlatformClient::new(&platform_url, &pairing_token)?;
    let result = client
        .pair_satellite(&agent_url, &capabilities, Some(&slug))
        .await?;

    println!("Satellite paired!");
    println!("  Satellite ID: {}", result.satellite_id);
    println!("  Orbit ID: {}", result.orbit_id);
    println!("  Name: {}", result.name);
    println!();

    // Save the identity with owner-only permissions
    let identity = SatelliteIdentity::new(
        result.satellite_id,
        result.orbit_id,
        result.name,
        result.api_key,
    );
    let satellite_file = layout.satellite_file();
    save_satellite(&satellite_file, &identity).await?;
    println!("Satellite credentials saved to: {:?}", satellite_file.path());

    // Save default settings
    let mut settings = Settings::default();
    settings.platform.base_url = platform_url;
    settings.deploy.agent_url = agent_url;

    let settings_file = layout.settings_file();
    settings_file.write_json(&settings).await?;
    println!("Settings saved to: {:?}", settings_file.path());

    // Print version info
    println!();
    println!("Agent version: {}", version.version);
    println!("Git hash: {}", version.git_hash);
    println!("Build time: {}", version.build_time);

    Ok(())
}

/// Get the system hostname
fn get_hostname() -> Option<String> {
    sysinfo::System::host_name()
}
