//! Logical remote actions the Dispatcher knows how to issue.
//!
//! Every variant is a read-only GET below `/api2/json/`. The descriptor says
//! *what* to fetch; the Dispatcher owns *how*.

use crate::core::domain::value_object::{GuestKind, Timeframe};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Version,
    ClusterStatus,
    ClusterLog {
        max: Option<usize>,
    },
    ClusterTasks,
    Nodes,
    NodeStatus {
        node: String,
    },
    NodeGuests {
        node: String,
        kind: GuestKind,
    },
    GuestStatus {
        node: String,
        kind: GuestKind,
        vmid: u32,
    },
    /// Guest agent interfaces for QEMU, `interfaces` for LXC.
    GuestInterfaces {
        node: String,
        kind: GuestKind,
        vmid: u32,
    },
    GuestSnapshots {
        node: String,
        kind: GuestKind,
        vmid: u32,
    },
    GuestFirewallRules {
        node: String,
        kind: GuestKind,
        vmid: u32,
    },
    NodeTasks {
        node: String,
        limit: Option<usize>,
        vmid: Option<u32>,
    },
    NodeStorage {
        node: String,
    },
    /// Cluster-wide storage definitions (`/storage`), carries mount details.
    StorageConfig,
    StorageContent {
        node: String,
        storage: String,
        content: Option<String>,
    },
    NodeNetwork {
        node: String,
    },
    NodeRrd {
        node: String,
        timeframe: Timeframe,
    },
    GuestRrd {
        node: String,
        kind: GuestKind,
        vmid: u32,
        timeframe: Timeframe,
    },
    Users,
    Roles,
    ClusterFirewallOptions,
    ClusterFirewallRules,
}

fn segments(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn guest_segments(node: &str, kind: GuestKind, vmid: u32, tail: &[&str]) -> Vec<String> {
    let mut path = segments(&["nodes", node, kind.as_str()]);
    path.push(vmid.to_string());
    path.extend(tail.iter().map(|p| p.to_string()));
    path
}

impl Operation {
    /// Path segments below `/api2/json/`. Segments are encoded by the URL layer.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Operation::Version => segments(&["version"]),
            Operation::ClusterStatus => segments(&["cluster", "status"]),
            Operation::ClusterLog { .. } => segments(&["cluster", "log"]),
            Operation::ClusterTasks => segments(&["cluster", "tasks"]),
            Operation::Nodes => segments(&["nodes"]),
            Operation::NodeStatus { node } => segments(&["nodes", node.as_str(), "status"]),
            Operation::NodeGuests { node, kind } => {
                segments(&["nodes", node.as_str(), kind.as_str()])
            }
            Operation::GuestStatus { node, kind, vmid } => {
                guest_segments(node, *kind, *vmid, &["status", "current"])
            }
            Operation::GuestInterfaces { node, kind, vmid } => match kind {
                GuestKind::Qemu => {
                    guest_segments(node, *kind, *vmid, &["agent", "network-get-interfaces"])
                }
                GuestKind::Lxc => guest_segments(node, *kind, *vmid, &["interfaces"]),
            },
            Operation::GuestSnapshots { node, kind, vmid } => {
                guest_segments(node, *kind, *vmid, &["snapshot"])
            }
            Operation::GuestFirewallRules { node, kind, vmid } => {
                guest_segments(node, *kind, *vmid, &["firewall", "rules"])
            }
            Operation::NodeTasks { node, .. } => segments(&["nodes", node.as_str(), "tasks"]),
            Operation::NodeStorage { node } => segments(&["nodes", node.as_str(), "storage"]),
            Operation::StorageConfig => segments(&["storage"]),
            Operation::StorageContent { node, storage, .. } => {
                segments(&["nodes", node.as_str(), "storage", storage.as_str(), "content"])
            }
            Operation::NodeNetwork { node } => segments(&["nodes", node.as_str(), "network"]),
            Operation::NodeRrd { node, .. } => segments(&["nodes", node.as_str(), "rrddata"]),
            Operation::GuestRrd {
                node, kind, vmid, ..
            } => guest_segments(node, *kind, *vmid, &["rrddata"]),
            Operation::Users => segments(&["access", "users"]),
            Operation::Roles => segments(&["access", "roles"]),
            Operation::ClusterFirewallOptions => segments(&["cluster", "firewall", "options"]),
            Operation::ClusterFirewallRules => segments(&["cluster", "firewall", "rules"]),
        }
    }

    /// Query parameters of the request, in a stable order.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        match self {
            Operation::ClusterLog { max: Some(max) } => query.push(("max", max.to_string())),
            Operation::NodeTasks { limit, vmid, .. } => {
                query.push(("source", "all".to_string()));
                if let Some(limit) = limit {
                    query.push(("limit", limit.to_string()));
                }
                if let Some(vmid) = vmid {
                    query.push(("vmid", vmid.to_string()));
                }
            }
            Operation::StorageContent {
                content: Some(content),
                ..
            } => query.push(("content", content.clone())),
            Operation::NodeRrd { timeframe, .. } | Operation::GuestRrd { timeframe, .. } => {
                query.push(("timeframe", timeframe.as_str().to_string()));
                query.push(("cf", "AVERAGE".to_string()));
            }
            _ => {}
        }
        query
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GET {}", self.segments().join("/"))
    }
}
