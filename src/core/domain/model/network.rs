//! Node network configuration and firewall state.

use crate::core::domain::error::PartialFailure;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub name: String,
    /// `bridge`, `bond`, `eth`, `vlan`, `OVSBridge`, ...
    pub kind: String,
    pub active: bool,
    pub autostart: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub position: u32,
    /// `in`, `out` or `group`.
    pub direction: String,
    /// `ACCEPT`, `DROP`, `REJECT` or a security group name.
    pub action: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macro_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Cluster-level firewall options plus rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallState {
    /// `None` when the options could not be read.
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_out: Option<String>,
    pub rules: Vec<FirewallRule>,
    pub failures: Vec<PartialFailure>,
}
