//! At most one live Session per endpoint identity.

use crate::core::{
    domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{
            cluster_endpoint::{ClusterEndpoint, SessionKey},
            operation::Operation,
            session::Session,
        },
    },
    infrastructure::dispatcher,
};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Caches authenticated Sessions keyed by host, principal and token id.
///
/// Reads of a valid Session only take the shared lock. Construction for one
/// key is serialized by a per-key mutex and re-checks the cache once it holds
/// it, so concurrent callers never build two Sessions for the same identity.
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: RwLock<HashMap<SessionKey, Arc<Session>>>,
    building: Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>,
    constructed: AtomicU64,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a usable Session for `endpoint`, building one when none is
    /// cached or the cached one expired or was invalidated.
    ///
    /// # Errors
    /// `Authentication` when the token is rejected, `Connectivity` when the
    /// cluster cannot be reached. The cache holds no entry for the endpoint
    /// afterwards.
    pub async fn acquire(&self, endpoint: &ClusterEndpoint) -> ProxmoxResult<Arc<Session>> {
        if endpoint.cache_ttl().is_zero() {
            return self.construct(endpoint).await.map(Arc::new);
        }

        let key = endpoint.session_key();
        if let Some(session) = self.cached(&key).await {
            debug!(host = key.authority(), session = session.id(), "reusing session");
            return Ok(session);
        }

        let key_lock = {
            let mut building = self.building.lock().await;
            Arc::clone(building.entry(key.clone()).or_default())
        };
        let _guard = key_lock.lock().await;

        // Another caller may have finished building while we waited.
        if let Some(session) = self.cached(&key).await {
            return Ok(session);
        }

        let result = match self.construct(endpoint).await {
            Ok(session) => {
                let session = Arc::new(session);
                self.sessions
                    .write()
                    .await
                    .insert(key.clone(), Arc::clone(&session));
                Ok(session)
            }
            Err(e) => {
                self.sessions.write().await.remove(&key);
                Err(e)
            }
        };

        // Waiters already hold their own handle to this lock.
        let mut building = self.building.lock().await;
        if building
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &key_lock))
        {
            building.remove(&key);
        }
        result
    }

    /// Drops the cached Session of `endpoint`, if any.
    pub async fn invalidate(&self, endpoint: &ClusterEndpoint) {
        let key = endpoint.session_key();
        if let Some(session) = self.sessions.write().await.remove(&key) {
            session.invalidate();
            info!(host = key.authority(), session = session.id(), "session dropped");
        }
    }

    /// Number of cached entries, usable or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// How many Sessions this cache has built so far.
    #[must_use]
    pub fn constructed(&self) -> u64 {
        self.constructed.load(Ordering::Relaxed)
    }

    async fn cached(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .await
            .get(key)
            .filter(|s| s.is_usable())
            .cloned()
    }

    /// Opens the transport and verifies the token with one `/version` call.
    async fn construct(&self, endpoint: &ClusterEndpoint) -> ProxmoxResult<Session> {
        let http_client = Client::builder()
            .timeout(endpoint.request_timeout())
            .connect_timeout(endpoint.request_timeout())
            .danger_accept_invalid_certs(!endpoint.verify_tls())
            .build()
            .map_err(|e| ProxmoxError::Connectivity(format!("Failed to build HTTP client: {}", e)))?;

        let session = Session::new(endpoint, http_client);
        self.constructed.fetch_add(1, Ordering::Relaxed);
        dispatcher::execute(&session, &Operation::Version).await?;
        info!(
            host = endpoint.host().as_str(),
            principal = %endpoint.principal(),
            session = session.id(),
            "session established"
        );
        Ok(session)
    }
}
