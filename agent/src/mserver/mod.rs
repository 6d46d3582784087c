//! Client for the in-container model servers

pub mod client;

use uuid::Uuid;

pub use client::ModelServerClient;

/// Produces a client scoped to one deployment's container.
///
/// A seam so tests can point clients at in-process stubs instead of the
/// private container network.
pub trait ModelServerFactory: Send + Sync {
    fn client_for(&self, deployment_id: Uuid) -> ModelServerClient;
}

/// Default factory reaching containers by name over the private network
pub struct NetworkModelServers {
    port: u16,
}

impl NetworkModelServers {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl ModelServerFactory for NetworkModelServers {
    fn client_for(&self, deployment_id: Uuid) -> ModelServerClient {
        ModelServerClient::for_container(deployment_id, self.port)
    }
}
