//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};
use uuid::Uuid;

use crate::server::state::ServerState;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "satgent".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Inference proxy handler.
///
/// Authorizes the caller's API key against the platform, injects the
/// deployment's resolved dynamic attributes into the request body (any
/// client-supplied `dynamic_attributes` key is overwritten) and forwards the
/// call to the deployment's model server.
pub async fn compute_handler(
    State(state): State<Arc<ServerState>>,
    Path(deployment_id): Path<Uuid>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, StatusCode> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match state.platform.authorize_inference_access(api_key).await {
        Ok(true) => {}
        Ok(false) => return Err(StatusCode::FORBIDDEN),
        Err(e) => {
            error!("Inference authorization call failed: {}", e);
            return Err(StatusCode::BAD_GATEWAY);
        }
    }

    let deployment = state
        .local
        .get(deployment_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    // Only JSON objects are forwarded; arrays, scalars and unparseable
    // bodies are rejected before they reach the model server.
    let mut request = match serde_json::from_str::<Value>(&body) {
        Ok(value @ Value::Object(_)) => value,
        _ => return Err(StatusCode::BAD_REQUEST),
    };
    request["dynamic_attributes"] = json!(deployment.dynamic_attributes);

    let client = state.mservers.client_for(deployment_id);
    match client.compute(&request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!("Compute proxy to {} failed: {}", deployment_id, e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}
