//! Pairing and inference authorization API client

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::AgentError;
use crate::http::client::PlatformClient;
use crate::models::capability::CapabilityDescriptor;

/// Result of a successful pairing call
#[derive(Debug, Clone, Deserialize)]
pub struct PairingResult {
    pub satellite_id: Uuid,
    pub orbit_id: Uuid,
    pub name: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
struct PairingRequest<'a> {
    base_url: &'a str,
    capabilities: &'a HashMap<String, CapabilityDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    authorized: bool,
}

impl PlatformClient {
    /// Pair this satellite with the platform.
    ///
    /// The client must be authenticated with a pairing token; the returned
    /// API key replaces the token for all later calls.
    pub async fn pair_satellite(
        &self,
        base_url: &str,
        capabilities: &HashMap<String, CapabilityDescriptor>,
        slug: Option<&str>,
    ) -> Result<PairingResult, AgentError> {
        let request = PairingRequest {
            base_url,
            capabilities,
            slug,
        };
        self.post("/satellites/pair", &request).await
    }

    /// Check whether an API key may call the inference endpoints
    pub async fn authorize_inference_access(&self, api_key: &str) -> Result<bool, AgentError> {
        let response: AuthorizeResponse = self
            .post("/inference/authorize", &json!({ "api_key": api_key }))
            .await?;
        Ok(response.authorized)
    }
}
