//! Deployment models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A deployment record owned by the platform.
///
/// The satellite reads it to learn what to run and writes back only the
/// terminal fields through `DeploymentPatch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique deployment ID
    pub id: Uuid,

    /// Orbit the deployment belongs to
    pub orbit_id: Uuid,

    /// Satellite the deployment is assigned to
    pub satellite_id: Uuid,

    /// Model artifact to serve
    pub artifact_id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Current status
    pub status: DeploymentStatus,

    /// URL under which the deployed model answers inference calls
    #[serde(default)]
    pub inference_url: Option<String>,

    /// Plain environment variables for the container
    #[serde(default)]
    pub env_variables: HashMap<String, String>,

    /// Environment variables resolved from orbit secrets (name -> secret id)
    #[serde(default)]
    pub env_variables_secrets: HashMap<String, Uuid>,

    /// Per-request dynamic attributes resolved from orbit secrets (name -> secret id)
    #[serde(default)]
    pub dynamic_attributes_secrets: HashMap<String, Uuid>,

    /// Schemas reported by the model server after a successful deploy
    #[serde(default)]
    pub schemas: Option<Value>,

    /// Error reported by the satellite for a failed attempt
    #[serde(default)]
    pub error_message: Option<DeploymentError>,
}

/// Deployment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Active,
    Failed,
    DeletionPending,
    DeletionFailed,
    NotResponding,
}

/// Error object attached to a failed deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentError {
    /// Machine-readable failure reason
    pub reason: String,

    /// Underlying error text, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Patch for the agent-writable deployment fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeploymentStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<DeploymentError>,
}

impl DeploymentPatch {
    /// Patch for a successful deploy
    pub fn active(inference_url: String, schemas: Value) -> Self {
        Self {
            status: Some(DeploymentStatus::Active),
            inference_url: Some(inference_url),
            schemas: Some(schemas),
            error_message: None,
        }
    }

    /// Patch for a failed deploy attempt
    pub fn failed(reason: impl Into<String>, error: Option<String>) -> Self {
        Self {
            status: Some(DeploymentStatus::Failed),
            error_message: Some(DeploymentError {
                reason: reason.into(),
                error,
            }),
            ..Default::default()
        }
    }

    /// Patch for a failed undeploy attempt
    pub fn deletion_failed(reason: impl Into<String>, error: Option<String>) -> Self {
        Self {
            status: Some(DeploymentStatus::DeletionFailed),
            error_message: Some(DeploymentError {
                reason: reason.into(),
                error,
            }),
            ..Default::default()
        }
    }
}
