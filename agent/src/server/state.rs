//! Server state

use std::sync::Arc;

use crate::cache::local::LocalDeployments;
use crate::http::PlatformApi;
use crate::mserver::ModelServerFactory;

/// Server state shared across handlers
pub struct ServerState {
    pub platform: Arc<dyn PlatformApi>,
    pub local: Arc<LocalDeployments>,
    pub mservers: Arc<dyn ModelServerFactory>,
}

impl ServerState {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        local: Arc<LocalDeployments>,
        mservers: Arc<dyn ModelServerFactory>,
    ) -> Self {
        Self {
            platform,
            local,
            mservers,
        }
    }
}
