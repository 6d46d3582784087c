//! Satellite identity file management

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AgentError;
use crate::filesys::file::File;
use crate::utils::epoch_secs;

/// Satellite identity stored locally after pairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteIdentity {
    /// Unique satellite ID assigned by the platform
    pub id: Uuid,

    /// Orbit this satellite belongs to
    pub orbit_id: Uuid,

    /// Satellite name
    pub name: String,

    /// Platform API key
    pub api_key: String,

    /// Pairing timestamp (Unix epoch seconds)
    pub paired_at: u64,
}

impl SatelliteIdentity {
    /// Create a new identity
    pub fn new(id: Uuid, orbit_id: Uuid, name: String, api_key: String) -> Self {
        Self {
            id,
            orbit_id,
            name,
            api_key,
            paired_at: epoch_secs(),
        }
    }
}

/// Assert that the satellite has been paired
pub async fn assert_paired(satellite_file: &File) -> Result<SatelliteIdentity, AgentError> {
    if !satellite_file.exists().await {
        return Err(AgentError::NotPaired(
            "Satellite file does not exist".to_string(),
        ));
    }

    let identity: SatelliteIdentity = satellite_file.read_json().await.map_err(|e| {
        AgentError::NotPaired(format!("Failed to read satellite file: {}", e))
    })?;

    if identity.api_key.is_empty() {
        return Err(AgentError::NotPaired(
            "Satellite API key is empty".to_string(),
        ));
    }

    Ok(identity)
}

/// Load identity from file
pub async fn load_satellite(satellite_file: &File) -> Result<SatelliteIdentity, AgentError> {
    satellite_file.read_json().await
}

/// Save identity to file with owner-only permissions
pub async fn save_satellite(
    satellite_file: &File,
    identity: &SatelliteIdentity,
) -> Result<(), AgentError> {
    satellite_file.write_json(identity).await?;
    satellite_file.set_permissions_600().await
}
