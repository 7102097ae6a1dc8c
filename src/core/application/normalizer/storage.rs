use super::raw::{RawStorage, RawVolume};
use crate::core::domain::{
    model::storage::{
        BackupRecord, RemoteMount, StorageAvailability, StoragePool, StorageType,
    },
    value_object::serde_helpers::epoch,
};

/// Normalizes one node's view of a pool. Returns `None` without a storage id.
pub(crate) fn normalize_storage(raw: RawStorage, node: &str) -> Option<StoragePool> {
    let id = raw.storage.filter(|s| !s.is_empty())?;
    let plugin = raw.plugin.unwrap_or_default();
    let total = raw.total.unwrap_or(0);
    let used = raw.used.unwrap_or(0);
    Some(StoragePool {
        id,
        storage_type: StorageType::from_plugin(&plugin),
        plugin,
        total,
        used,
        available: raw.avail.unwrap_or_else(|| total.saturating_sub(used)),
        shared: raw.shared.unwrap_or(false),
        content: raw.content,
        nodes: vec![StorageAvailability {
            node: node.to_string(),
            active: raw.active.unwrap_or(false),
            enabled: raw.enabled.unwrap_or(true),
        }],
        remote: None,
        backup_count: None,
    })
}

/// Remote mount details from a cluster storage definition.
///
/// Only network-backed types carry one, and only when a server is known.
pub(crate) fn remote_mount(raw: &RawStorage) -> Option<RemoteMount> {
    let storage_type = StorageType::from_plugin(raw.plugin.as_deref().unwrap_or_default());
    if !storage_type.is_network_backed() {
        return None;
    }
    let server = raw.server.clone().or_else(|| raw.portal.clone())?;
    let export = match storage_type {
        StorageType::Nfs => raw.export.clone(),
        StorageType::Cifs => raw.share.clone(),
        StorageType::GlusterFs => raw.volume.clone(),
        StorageType::Iscsi => raw.target.clone(),
        _ => None,
    }
    .or_else(|| raw.path.clone());
    Some(RemoteMount { server, export })
}

pub(crate) fn normalize_backup(raw: RawVolume, storage: &str, node: &str) -> Option<BackupRecord> {
    let volid = raw.volid.filter(|v| !v.is_empty())?;
    Some(BackupRecord {
        vmid: raw.vmid.or_else(|| vmid_from_volid(&volid)),
        volid,
        storage: storage.to_string(),
        node: node.to_string(),
        size: raw.size.unwrap_or(0),
        format: raw.format,
        created_at: epoch(raw.ctime),
        notes: raw.notes,
        protected: raw.protected.unwrap_or(false),
    })
}

/// `local:backup/vzdump-qemu-101-2024_01_01-00_00_00.vma.zst` names its guest.
fn vmid_from_volid(volid: &str) -> Option<u32> {
    let file = volid.rsplit('/').next()?;
    let mut parts = file.strip_prefix("vzdump-")?.split('-');
    let _kind = parts.next()?;
    parts.next()?.parse().ok()
}
