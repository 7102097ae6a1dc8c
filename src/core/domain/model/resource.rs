//! Normalized node and guest snapshots.
//!
//! Built fresh from raw API records on every call and never cached.

use crate::core::{application::normalizer, domain::value_object::GuestKind};
use serde::Serialize;
use std::fmt;

/// What a [`NormalizedResource`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Node,
    Qemu,
    Lxc,
}

impl From<GuestKind> for ResourceKind {
    fn from(kind: GuestKind) -> Self {
        match kind {
            GuestKind::Qemu => ResourceKind::Qemu,
            GuestKind::Lxc => ResourceKind::Lxc,
        }
    }
}

impl ResourceKind {
    /// The guest kind, or `None` for nodes.
    #[must_use]
    pub fn guest_kind(&self) -> Option<GuestKind> {
        match self {
            ResourceKind::Node => None,
            ResourceKind::Qemu => Some(GuestKind::Qemu),
            ResourceKind::Lxc => Some(GuestKind::Lxc),
        }
    }
}

/// Closed run state of a node or guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Running,
    Stopped,
    Paused,
    Unknown,
}

impl ResourceStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Running => "running",
            ResourceStatus::Stopped => "stopped",
            ResourceStatus::Paused => "paused",
            ResourceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node or guest resource snapshot in one stable shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResource {
    /// `node/<name>`, `qemu/<vmid>` or `lxc/<vmid>`.
    pub id: String,
    pub kind: ResourceKind,
    /// Guest id; `None` for nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmid: Option<u32>,
    pub name: String,
    pub status: ResourceStatus,
    /// CPU utilization ratio in `[0, 1]`.
    pub cpu: f64,
    /// Number of (virtual) CPUs, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_count: Option<u32>,
    pub memory_used: u64,
    pub memory_total: u64,
    pub disk_used: u64,
    pub disk_total: u64,
    /// Uptime in seconds.
    pub uptime: u64,
    /// Node the resource lives on (the node itself for nodes).
    pub node: String,
    /// Primary IP address; `None` when no agent/network data is available.
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub template: bool,
}

impl NormalizedResource {
    /// Memory utilization ratio in `[0, 1]`.
    #[must_use]
    pub fn memory_ratio(&self) -> f64 {
        normalizer::normalize_percentage(self.memory_used as f64, self.memory_total as f64)
    }

    /// Disk utilization ratio in `[0, 1]`.
    #[must_use]
    pub fn disk_ratio(&self) -> f64 {
        normalizer::normalize_percentage(self.disk_used as f64, self.disk_total as f64)
    }

    /// Uptime rendered as `"1d 1h 1m"`, or `"offline"`.
    #[must_use]
    pub fn uptime_display(&self) -> String {
        normalizer::normalize_uptime(self.uptime, self.status)
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.kind != ResourceKind::Node
    }
}

/// Detailed node status from `/nodes/{node}/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetail {
    pub resource: NormalizedResource,
    /// Load average over 1, 5 and 15 minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_average: Option<[f64; 3]>,
    /// IO wait ratio in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_wait: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pve_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_model: Option<String>,
    pub swap_used: u64,
    pub swap_total: u64,
}
