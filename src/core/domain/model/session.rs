//! An authenticated handle bound to one [`ClusterEndpoint`].

use crate::core::domain::{model::cluster_endpoint::ClusterEndpoint, value_object::ProxmoxUrl};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// An authenticated transport handle.
///
/// Owned by the Session Cache and handed out as `Arc<Session>`. A Session is
/// unusable once it is older than its TTL or once an authentication failure
/// invalidated it; the cache then builds a replacement.
#[derive(Debug)]
pub struct Session {
    id: u64,
    http_client: Client,
    base_url: ProxmoxUrl,
    authorization: String,
    created_at: Instant,
    ttl: Duration,
    invalidated: AtomicBool,
}

impl Session {
    pub(crate) fn new(endpoint: &ClusterEndpoint, http_client: Client) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            http_client,
            base_url: endpoint.url().clone(),
            authorization: endpoint.authorization_value(),
            created_at: Instant::now(),
            ttl: endpoint.cache_ttl(),
            invalidated: AtomicBool::new(false),
        }
    }

    /// Process-unique identity of this Session.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Checks if the session outlived its TTL.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.age() >= self.ttl
    }

    /// Marks the session unusable; the next acquire rebuilds it.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// `true` while the session may still be handed out.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.is_invalidated() && !self.is_expired()
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn base_url(&self) -> &ProxmoxUrl {
        &self.base_url
    }

    pub(crate) fn authorization(&self) -> &str {
        &self.authorization
    }
}
