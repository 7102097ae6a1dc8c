//! Aggregate results and the filters that shape them.
//!
//! Every aggregate that fans out carries a `failures` list: sub-calls that
//! failed are reported there while the rest of the result stays valid.

use crate::core::domain::{
    error::PartialFailure,
    model::{
        resource::{NormalizedResource, ResourceStatus},
        snapshot::GuestSnapshots,
        storage::{BackupRecord, StoragePool, StorageType},
        task::{TaskRecord, TaskStatus},
    },
    value_object::GuestKind,
};
use serde::Serialize;

/// Version information from `/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiVersion {
    pub version: String,
    pub release: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repoid: Option<String>,
}

/// Guest counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuestCounts {
    pub running: usize,
    pub stopped: usize,
    pub paused: usize,
    pub unknown: usize,
}

impl GuestCounts {
    pub(crate) fn record(&mut self, status: ResourceStatus) {
        match status {
            ResourceStatus::Running => self.running += 1,
            ResourceStatus::Stopped => self.stopped += 1,
            ResourceStatus::Paused => self.paused += 1,
            ResourceStatus::Unknown => self.unknown += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.running + self.stopped + self.paused + self.unknown
    }
}

/// Used/total pair for a byte capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CapacityTotals {
    pub used: u64,
    pub total: u64,
    /// `used / total` in `[0, 1]`, 0 when the total is unknown.
    pub ratio: f64,
}

/// Cluster CPU capacity and load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CpuTotals {
    /// Sum of CPUs over the nodes that reported them.
    pub cores: u32,
    /// CPUs busy on average (`Σ cpu_ratio × cores`).
    pub used_cores: f64,
    /// `used_cores / cores` in `[0, 1]`.
    pub ratio: f64,
}

/// One node's slot in a [`ClusterSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub node: NormalizedResource,
    /// QEMU guests first, then LXC, each in listing order.
    pub guests: Vec<NormalizedResource>,
    /// Set when any sub-call for this node failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<PartialFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// `None` when the quorum state could not be read.
    pub quorate: Option<bool>,
    /// In cluster listing order.
    pub nodes: Vec<NodeSummary>,
    pub cpu: CpuTotals,
    pub memory: CapacityTotals,
    pub disk: CapacityTotals,
    pub guest_counts: GuestCounts,
    pub failures: Vec<PartialFailure>,
}

impl ClusterSummary {
    /// `true` when at least one sub-call failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&NodeSummary> {
        self.nodes.iter().find(|n| n.node.name == name)
    }
}

/// Guest listing filter. Applied after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestFilter {
    pub node: Option<String>,
    pub kind: Option<GuestKind>,
    pub status: Option<ResourceStatus>,
}

impl GuestFilter {
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn kind(mut self, kind: GuestKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: ResourceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn matches(&self, guest: &NormalizedResource) -> bool {
        self.node.as_ref().is_none_or(|n| *n == guest.node)
            && self
                .kind
                .is_none_or(|k| guest.kind.guest_kind() == Some(k))
            && self.status.is_none_or(|s| guest.status == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestListing {
    pub guests: Vec<NormalizedResource>,
    pub failures: Vec<PartialFailure>,
}

/// Storage listing filter. Applied after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageFilter {
    pub node: Option<String>,
    pub storage_type: Option<StorageType>,
    /// Only network-backed pools (NFS, CIFS, GlusterFS, iSCSI).
    pub network_only: bool,
}

impl StorageFilter {
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn storage_type(mut self, storage_type: StorageType) -> Self {
        self.storage_type = Some(storage_type);
        self
    }

    pub fn network_only(mut self, network_only: bool) -> Self {
        self.network_only = network_only;
        self
    }

    pub(crate) fn matches(&self, pool: &StoragePool) -> bool {
        self.storage_type.is_none_or(|t| pool.storage_type == t)
            && (!self.network_only || pool.storage_type.is_network_backed())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageListing {
    pub pools: Vec<StoragePool>,
    pub failures: Vec<PartialFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupListing {
    pub backups: Vec<BackupRecord>,
    pub failures: Vec<PartialFailure>,
}

/// Task history filter. Applied after normalization, `limit` last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub node: Option<String>,
    pub vmid: Option<u32>,
    pub status: Option<TaskStatus>,
    pub limit: Option<usize>,
}

impl TaskFilter {
    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn vmid(mut self, vmid: u32) -> Self {
        self.vmid = Some(vmid);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn matches(&self, task: &TaskRecord) -> bool {
        self.node.as_ref().is_none_or(|n| *n == task.node)
            && self.vmid.is_none_or(|v| task.guest_id == Some(v))
            && self.status.is_none_or(|s| task.status == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskListing {
    pub tasks: Vec<TaskRecord>,
    pub failures: Vec<PartialFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotListing {
    pub guests: Vec<GuestSnapshots>,
    pub failures: Vec<PartialFailure>,
}
