//! Model server HTTP client

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::errors::AgentError;
use crate::runtime::container_name;

/// Per-probe HTTP timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Short-lived HTTP client scoped to one deployment's container
pub struct ModelServerClient {
    client: Client,
    base_url: String,
}

impl ModelServerClient {
    /// Client reaching the container by name over the private network
    pub fn for_container(deployment_id: Uuid, port: u16) -> Self {
        Self::with_base_url(format!(
            "http://{}:{}",
            container_name(deployment_id),
            port
        ))
    }

    /// Client with an explicit base URL (tests, alternate topologies)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the health endpoint with a bounded retry budget.
    ///
    /// Each probe succeeds only on HTTP 200; any other response or transport
    /// error is swallowed and retried after `probe_interval`. Exhausting the
    /// budget yields `false`, never an error.
    pub async fn is_healthy(&self, attempts: u32, probe_interval: Duration) -> bool {
        let url = format!("{}/healthz", self.base_url);

        for attempt in 1..=attempts {
            match self.client.get(&url).send().await {
                Ok(response) if response.status() == reqwest::StatusCode::OK => {
                    debug!("Health probe succeeded after {} attempt(s)", attempt);
                    return true;
                }
                Ok(response) => {
                    debug!(
                        "Health probe attempt {}/{}: status {}",
                        attempt,
                        attempts,
                        response.status()
                    );
                }
                Err(e) => {
                    debug!("Health probe attempt {}/{}: {}", attempt, attempts, e);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(probe_interval).await;
            }
        }

        warn!(
            "Health check exhausted {} attempts against {}",
            attempts, url
        );
        false
    }

    /// Fetch the model server's OpenAPI schema; best-effort
    pub async fn get_openapi_schema(&self) -> Option<Value> {
        self.get_json("/openapi.json").await
    }

    /// Fetch the model server's manifest; best-effort
    pub async fn get_manifest(&self) -> Option<Value> {
        self.get_json("/manifest").await
    }

    async fn get_json(&self, path: &str) -> Option<Value> {
        let url = format!("{}{}", self.base_url, path);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => match response.json().await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Failed to decode {}: {}", url, e);
                    None
                }
            },
            Ok(response) => {
                debug!("GET {} returned {}", url, response.status());
                None
            }
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                None
            }
        }
    }

    /// Proxy an inference call to the model server
    pub async fn compute(&self, body: &Value) -> Result<Value, AgentError> {
        let url = format!("{}/compute", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Compute call failed: {} - {}", status, body);
            return Err(AgentError::ModelServerError(format!(
                "{}: {}",
                status, body
            )));
        }

        let value = response.json().await?;
        Ok(value)
    }
}
