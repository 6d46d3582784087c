//! Local deployment cache
//!
//! Ephemeral, agent-side record of what is deployed: rebuilt on each deploy,
//! discarded on undeploy, never persisted. All durable state lives on the
//! platform or in the container engine.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use uuid::Uuid;

/// Agent-side state for one active deployment
#[derive(Debug, Clone)]
pub struct LocalDeployment {
    pub deployment_id: Uuid,

    /// Resolved dynamic attribute secrets, injected into compute requests
    pub dynamic_attributes: HashMap<String, String>,

    /// Manifest reported by the model server, when available
    pub manifest: Option<Value>,

    /// OpenAPI schema reported by the model server, when available
    pub openapi_schema: Option<Value>,
}

/// In-memory map of active deployments
#[derive(Default)]
pub struct LocalDeployments {
    entries: RwLock<HashMap<Uuid, LocalDeployment>>,
}

impl LocalDeployments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) a deployment's local state
    pub fn insert(&self, deployment: LocalDeployment) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(deployment.deployment_id, deployment);
    }

    /// Look up a deployment's local state
    pub fn get(&self, deployment_id: Uuid) -> Option<LocalDeployment> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&deployment_id).cloned()
    }

    /// Discard a deployment's local state
    pub fn remove(&self, deployment_id: Uuid) -> Option<LocalDeployment> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&deployment_id)
    }

    /// Number of tracked deployments
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Check if any deployments are tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let cache = LocalDeployments::new();
        let id = Uuid::new_v4();

        cache.insert(LocalDeployment {
            deployment_id: id,
            dynamic_attributes: HashMap::from([("key".to_string(), "value".to_string())]),
            manifest: None,
            openapi_schema: None,
        });

        assert_eq!(cache.len(), 1);
        let entry = cache.get(id).unwrap();
        assert_eq!(entry.dynamic_attributes["key"], "value");

        assert!(cache.remove(id).is_some());
        assert!(cache.is_empty());
        assert!(cache.get(id).is_none());
    }
}
