//! Storage pools and backup volumes.

use crate::core::domain::value_object::serde_helpers::optional_system_time;
use serde::Serialize;
use std::time::SystemTime;

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Directory,
    Lvm,
    Nfs,
    Cifs,
    GlusterFs,
    Iscsi,
    Zfs,
    Other,
}

impl StorageType {
    /// Maps a Proxmox storage plugin name (`dir`, `lvmthin`, `zfspool`, ...).
    #[must_use]
    pub fn from_plugin(plugin: &str) -> Self {
        match plugin.trim().to_ascii_lowercase().as_str() {
            "dir" | "btrfs" => StorageType::Directory,
            "lvm" | "lvmthin" => StorageType::Lvm,
            "nfs" => StorageType::Nfs,
            "cifs" | "smb" => StorageType::Cifs,
            "glusterfs" => StorageType::GlusterFs,
            "iscsi" | "iscsidirect" => StorageType::Iscsi,
            "zfs" | "zfspool" => StorageType::Zfs,
            _ => StorageType::Other,
        }
    }

    /// Whether the backend lives on a remote server (NAS/SAN).
    #[must_use]
    pub fn is_network_backed(&self) -> bool {
        matches!(
            self,
            StorageType::Nfs | StorageType::Cifs | StorageType::GlusterFs | StorageType::Iscsi
        )
    }
}

/// Where a network-backed pool is mounted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteMount {
    pub server: String,
    /// NFS export, CIFS share, GlusterFS volume or iSCSI target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,
}

/// How one node sees a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageAvailability {
    pub node: String,
    pub active: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoragePool {
    pub id: String,
    pub storage_type: StorageType,
    /// The raw plugin name, kept for types folded into `Other`.
    pub plugin: String,
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub shared: bool,
    /// Content tags (`images`, `rootdir`, `backup`, `iso`, ...).
    pub content: Vec<String>,
    pub nodes: Vec<StorageAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteMount>,
    /// Number of backup volumes, when it was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_count: Option<usize>,
}

impl StoragePool {
    /// Used-space ratio in `[0, 1]`.
    #[must_use]
    pub fn usage_ratio(&self) -> f64 {
        crate::core::application::normalizer::normalize_percentage(
            self.used as f64,
            self.total as f64,
        )
    }

    #[must_use]
    pub fn holds(&self, content: &str) -> bool {
        self.content.iter().any(|c| c == content)
    }
}

/// A backup volume found in a pool's content listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub volid: String,
    pub storage: String,
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmid: Option<u32>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(with = "optional_system_time")]
    pub created_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub protected: bool,
}
