//! Orbit secrets API client

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AgentError;
use crate::http::client::PlatformClient;
use crate::models::secret::Secret;

/// List of secrets response
#[derive(Deserialize)]
pub struct SecretListResponse {
    pub secrets: Vec<Secret>,
}

impl PlatformClient {
    /// Fetch a single orbit secret by id
    pub async fn get_orbit_secret(&self, id: Uuid) -> Result<Secret, AgentError> {
        let path = format!("/orbit/secrets/{}", id);
        self.get(&path).await
    }

    /// Fetch all orbit secrets visible to this satellite
    pub async fn get_orbit_secrets(&self) -> Result<Vec<Secret>, AgentError> {
        let response: SecretListResponse = self.get("/orbit/secrets").await?;
        Ok(response.secrets)
    }
}
