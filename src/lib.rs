mod core;
mod resources;

pub use crate::core::{
    application::normalizer::{
        ByteSize, ByteUnit, normalize_bytes, normalize_percentage, normalize_status,
        normalize_uptime,
    },
    domain::{
        error::{ErrorKind, PartialFailure, ProxmoxError, ProxmoxResult, ValidationError},
        model::{
            access::{RoleRecord, UserRecord},
            cluster_endpoint::{
                ClusterEndpoint, ClusterEndpointBuilder, DEFAULT_CACHE_TTL,
                DEFAULT_REQUEST_TIMEOUT, RateLimitConfig, SessionKey,
            },
            history::{HistoryPoint, HistorySeries, StatsTarget},
            network::{FirewallRule, FirewallState, NetworkInterface},
            operation::Operation,
            resource::{NodeDetail, NormalizedResource, ResourceKind, ResourceStatus},
            session::Session,
            snapshot::{GuestSnapshots, Snapshot},
            storage::{
                BackupRecord, RemoteMount, StorageAvailability, StoragePool, StorageType,
            },
            summary::{
                ApiVersion, BackupListing, CapacityTotals, ClusterSummary, CpuTotals,
                GuestCounts, GuestFilter, GuestListing, NodeSummary, SnapshotListing,
                StorageFilter, StorageListing, TaskFilter, TaskListing,
            },
            task::{ClusterEvent, TaskRecord, TaskStatus},
        },
        value_object::{
            DEFAULT_PORT, GuestKind, ProxmoxApiToken, ProxmoxHost, ProxmoxPort,
            ProxmoxPrincipal, ProxmoxUrl, Timeframe,
        },
    },
    infrastructure::{
        dispatcher::{Dispatch, Dispatcher},
        session_cache::SessionCache,
    },
};

use crate::core::application::normalizer::records;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// A read-only monitoring gateway over one Proxmox VE cluster.
///
/// Every operation acquires a Session from the [`SessionCache`], issues its
/// calls through the [`Dispatch`] implementation, normalizes the raw payloads
/// and folds them into one result. Multi-node operations tolerate failing
/// members: the failures are reported next to the data instead of failing
/// the whole call.
///
/// # Examples
///
/// ```no_run
/// use leeca_proxmox_monitor::{ClusterEndpoint, ProxmoxGateway, ProxmoxResult};
///
/// #[tokio::main]
/// async fn main() -> ProxmoxResult<()> {
///     let endpoint = ClusterEndpoint::builder()
///         .host("pve.example.com")
///         .principal("monitor@pve")
///         .token("readonly", "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx")
///         .verify_tls(false)
///         .build()?;
///
///     let gateway = ProxmoxGateway::new(endpoint)?;
///     let summary = gateway.cluster_summary().await?;
///     for slot in &summary.nodes {
///         println!("{} {}", slot.node.name, slot.node.uptime_display());
///     }
///     for failure in &summary.failures {
///         eprintln!("partial: {}", failure);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ProxmoxGateway<D: Dispatch = Dispatcher> {
    endpoint: ClusterEndpoint,
    sessions: Arc<SessionCache>,
    dispatcher: D,
}

impl ProxmoxGateway<Dispatcher> {
    /// Creates a gateway with the HTTP Dispatcher and a private Session Cache.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Validation` if the endpoint's rate limit is invalid.
    pub fn new(endpoint: ClusterEndpoint) -> ProxmoxResult<Self> {
        let dispatcher = Dispatcher::new(endpoint.rate_limit())?;
        Ok(Self::with_dispatcher(endpoint, dispatcher))
    }
}

impl<D: Dispatch> ProxmoxGateway<D> {
    /// Creates a gateway over a custom [`Dispatch`] implementation.
    pub fn with_dispatcher(endpoint: ClusterEndpoint, dispatcher: D) -> Self {
        Self {
            endpoint,
            sessions: Arc::new(SessionCache::new()),
            dispatcher,
        }
    }

    /// Shares `cache` with other gateways, so equivalent endpoints reuse one Session.
    pub fn with_session_cache(mut self, cache: Arc<SessionCache>) -> Self {
        self.sessions = cache;
        self
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    pub fn session_cache(&self) -> &Arc<SessionCache> {
        &self.sessions
    }

    /// Acquires a Session and dispatches one operation.
    ///
    /// An authentication failure always invalidates the Session used, so the
    /// next acquire rebuilds it whatever the Dispatch implementation did.
    pub(crate) async fn fetch(&self, operation: &Operation) -> ProxmoxResult<Value> {
        let session = self.sessions.acquire(&self.endpoint).await?;
        let result = self.dispatcher.call(&session, operation).await;
        if let Err(ProxmoxError::Authentication(_)) = &result {
            session.invalidate();
        }
        result
    }

    /// Fetches a list payload and reads its records.
    pub(crate) async fn fetch_records<T: DeserializeOwned>(
        &self,
        operation: &Operation,
    ) -> ProxmoxResult<Vec<T>> {
        Ok(records(self.fetch(operation).await?))
    }

    /// Fetches a single-object payload.
    pub(crate) async fn fetch_record<T: DeserializeOwned + Default>(
        &self,
        operation: &Operation,
    ) -> ProxmoxResult<T> {
        Ok(crate::core::application::normalizer::raw::record(
            self.fetch(operation).await?,
        ))
    }
}
