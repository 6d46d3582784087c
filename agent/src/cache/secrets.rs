//! Orbit secrets cache
//!
//! Lazily filled, periodically refreshed cache of orbit secret values. The
//! background refresh loop clears and repopulates the whole cache so revoked
//! secrets age out within one interval.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AgentError;
use crate::http::PlatformApi;
use crate::models::secret::Secret;

/// Process-wide cache of orbit secrets
pub struct SecretsCache {
    platform: Arc<dyn PlatformApi>,
    refresh_interval: Duration,
    entries: RwLock<HashMap<Uuid, Secret>>,
    initialized: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    refresh_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SecretsCache {
    /// Create a new, empty cache
    pub fn new(platform: Arc<dyn PlatformApi>, refresh_interval: Duration) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            platform,
            refresh_interval,
            entries: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            shutdown_tx,
            refresh_handle: Mutex::new(None),
        })
    }

    /// Perform the initial bulk fill and start the background refresh loop.
    ///
    /// Idempotent: calls after the first are no-ops. A failed bulk fetch is
    /// logged; the cache is then filled on demand by `get_secret`.
    pub async fn initialize(self: &Arc<Self>) -> Result<(), AgentError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Secrets cache already initialized");
            return Ok(());
        }

        if let Err(e) = self.refill().await {
            warn!("Initial secrets fetch failed: {}", e);
        }

        let cache = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        info!("Secrets refresh loop shutting down...");
                        return;
                    }
                    _ = tokio::time::sleep(cache.refresh_interval) => {}
                }

                debug!("Refreshing secrets cache...");
                if let Err(e) = cache.refill().await {
                    warn!("Secrets refresh failed: {}", e);
                }
            }
        });

        *self.refresh_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Clear and repopulate the cache from a fresh bulk fetch
    async fn refill(&self) -> Result<(), AgentError> {
        let secrets = self.platform.get_orbit_secrets().await?;
        let fresh: HashMap<Uuid, Secret> = secrets.into_iter().map(|s| (s.id, s)).collect();
        let count = fresh.len();

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *entries = fresh;
        debug!("Secrets cache holds {} entries", count);
        Ok(())
    }

    /// Look up a secret, cache-first.
    ///
    /// On a miss a single on-demand remote fetch is attempted; a remote
    /// failure resolves to `None` and is only logged.
    pub async fn get_secret(&self, id: Uuid) -> Option<Secret> {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(secret) = entries.get(&id) {
                return Some(secret.clone());
            }
        }

        match self.platform.get_orbit_secret(id).await {
            Ok(secret) => {
                let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
                entries.insert(id, secret.clone());
                Some(secret)
            }
            Err(e) => {
                warn!("Failed to fetch secret {}: {}", id, e);
                None
            }
        }
    }

    /// Stop the background refresh loop and wait for it to exit
    pub async fn shutdown(&self) -> Result<(), AgentError> {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.refresh_handle.lock().await.take() {
            handle
                .await
                .map_err(|e| AgentError::ShutdownError(e.to_string()))?;
        }
        Ok(())
    }
}
