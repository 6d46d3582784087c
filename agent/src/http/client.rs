//! HTTP client implementation

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::errors::AgentError;

/// HTTP client for platform communication
pub struct PlatformClient {
    client: Client,
    base_url: String,
    api_key: String,
    satellite_id: Option<Uuid>,
}

impl PlatformClient {
    /// Create a new platform client authenticated with an API key
    /// (or a pairing token during installation)
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            satellite_id: None,
        })
    }

    /// Attach the satellite ID sent with every request
    pub fn with_satellite_id(mut self, satellite_id: Uuid) -> Self {
        self.satellite_id = Some(satellite_id);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the satellite ID, erroring when the client is not yet paired
    pub(crate) fn satellite_id(&self) -> Result<Uuid, AgentError> {
        self.satellite_id
            .ok_or_else(|| AgentError::PlatformError("satellite id not set".to_string()))
    }

    fn headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request.header(
            header::AUTHORIZATION,
            format!("Bearer {}", self.api_key),
        );
        if let Some(satellite_id) = self.satellite_id {
            request = request.header("X-Satellite-ID", satellite_id.to_string());
        }
        request
    }

    /// Make a GET request
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = self.headers(self.client.get(&url));
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(AgentError::PlatformError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = self.headers(self.client.post(&url).json(body));
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP POST failed: {} - {}", status, body);
            return Err(AgentError::PlatformError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a PATCH request
    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PATCH {}", url);

        let request = self.headers(self.client.patch(&url).json(body));
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP PATCH failed: {} - {}", status, body);
            return Err(AgentError::PlatformError(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a DELETE request
    pub(crate) async fn delete(&self, path: &str) -> Result<(), AgentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let request = self.headers(self.client.delete(&url));
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP DELETE failed: {} - {}", status, body);
            return Err(AgentError::PlatformError(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}
