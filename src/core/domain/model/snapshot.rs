use crate::core::domain::value_object::{GuestKind, serde_helpers::optional_system_time};
use serde::Serialize;
use std::time::SystemTime;

/// A guest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "optional_system_time")]
    pub created_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Whether RAM state was saved with the snapshot (QEMU only).
    pub includes_ram: bool,
}

/// The snapshots of one guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestSnapshots {
    pub node: String,
    pub kind: GuestKind,
    pub vmid: u32,
    pub name: String,
    pub snapshots: Vec<Snapshot>,
}
