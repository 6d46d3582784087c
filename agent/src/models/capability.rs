//! Capability payload advertised at pairing time

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Descriptor for one advertised capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Capability version (the agent version)
    pub version: String,

    /// Supported variants of the capability
    #[serde(default)]
    pub variants: Vec<String>,
}

/// Build the capabilities map from the supported task types.
///
/// The platform uses this to know which task types it may queue for the
/// satellite.
pub fn capabilities_payload(
    task_types: &[&str],
    version: &str,
) -> HashMap<String, CapabilityDescriptor> {
    task_types
        .iter()
        .map(|t| {
            (
                t.to_string(),
                CapabilityDescriptor {
                    version: version.to_string(),
                    variants: Vec::new(),
                },
            )
        })
        .collect()
}
