use super::{collapse, require_id};
use crate::{
    BackupListing, BackupRecord, Dispatch, Operation, PartialFailure, ProxmoxGateway,
    ProxmoxResult, RemoteMount, StorageFilter, StorageListing, StoragePool,
    core::application::normalizer::{
        self,
        raw::{RawStorage, RawVolume},
    },
};
use futures::future::join_all;
use std::collections::HashMap;

const BACKUP_CONTENT: &str = "backup";
const STORAGE_CONFIG: &str = "storage-config";

impl<D: Dispatch> ProxmoxGateway<D> {
    /// Storage pools across the cluster, or on `filter.node` only.
    ///
    /// Cluster-wide, pools are merged by id in first-seen order: shared pools
    /// count once, local pools add up over nodes. Remote mount details come
    /// from the cluster storage configuration. For a single node, backup
    /// counts are filled in for pools that hold backups.
    pub async fn storage_summary(&self, filter: &StorageFilter) -> ProxmoxResult<StorageListing> {
        let (nodes, mut failures) = self.fan_out_nodes(filter.node.as_deref()).await?;

        let per_node = join_all(nodes.iter().map(|node| self.node_pools(node)));
        let config = self.fetch_records::<RawStorage>(&Operation::StorageConfig);
        let (per_node, config) = futures::join!(per_node, config);

        let mut pools: Vec<StoragePool> = Vec::new();
        for (node, result) in nodes.iter().zip(per_node) {
            match result {
                Ok(node_pools) => {
                    for pool in node_pools {
                        merge_pool(&mut pools, pool);
                    }
                }
                Err(e) => failures.extend(collapse(node, &[("storage", e)])),
            }
        }

        match config {
            Ok(definitions) => {
                let mounts: HashMap<String, RemoteMount> = definitions
                    .iter()
                    .filter_map(|d| Some((d.storage.clone()?, normalizer::remote_mount(d)?)))
                    .collect();
                for pool in &mut pools {
                    pool.remote = mounts.get(&pool.id).cloned();
                }
            }
            Err(e) => failures.push(PartialFailure::new(STORAGE_CONFIG, &e)),
        }

        pools.retain(|p| filter.matches(p));

        if let [node] = nodes.as_slice()
            && filter.node.is_some()
        {
            let counts = join_all(
                pools
                    .iter()
                    .filter(|p| p.holds(BACKUP_CONTENT))
                    .map(|p| async move { (p.id.clone(), self.backups(node, &p.id).await) }),
            )
            .await;
            for (id, result) in counts {
                match result {
                    Ok(backups) => {
                        if let Some(pool) = pools.iter_mut().find(|p| p.id == id) {
                            pool.backup_count = Some(backups.len());
                        }
                    }
                    Err(e) => failures.push(PartialFailure::new(format!("{}/{}", node, id), &e)),
                }
            }
        }

        Ok(StorageListing { pools, failures })
    }

    /// Backup volumes on one node, from `storage` or from every pool that
    /// holds backups.
    pub async fn backup_inventory(
        &self,
        node: &str,
        storage: Option<&str>,
    ) -> ProxmoxResult<BackupListing> {
        require_id("node", node)?;
        if let Some(storage) = storage {
            require_id("storage", storage)?;
            return Ok(BackupListing {
                backups: self.backups(node, storage).await?,
                failures: Vec::new(),
            });
        }

        let pools: Vec<StoragePool> = self
            .node_pools(node)
            .await?
            .into_iter()
            .filter(|p| p.holds(BACKUP_CONTENT))
            .collect();
        let results = join_all(pools.iter().map(|p| self.backups(node, &p.id))).await;

        let mut backups = Vec::new();
        let mut failures = Vec::new();
        for (pool, result) in pools.iter().zip(results) {
            match result {
                Ok(found) => backups.extend(found),
                Err(e) => failures.push(PartialFailure::new(format!("{}/{}", node, pool.id), &e)),
            }
        }
        Ok(BackupListing { backups, failures })
    }

    async fn node_pools(&self, node: &str) -> ProxmoxResult<Vec<StoragePool>> {
        let raw: Vec<RawStorage> = self
            .fetch_records(&Operation::NodeStorage {
                node: node.to_string(),
            })
            .await?;
        Ok(raw
            .into_iter()
            .filter_map(|r| normalizer::normalize_storage(r, node))
            .collect())
    }

    async fn backups(&self, node: &str, storage: &str) -> ProxmoxResult<Vec<BackupRecord>> {
        let raw: Vec<RawVolume> = self
            .fetch_records(&Operation::StorageContent {
                node: node.to_string(),
                storage: storage.to_string(),
                content: Some(BACKUP_CONTENT.to_string()),
            })
            .await?;
        Ok(raw
            .into_iter()
            .filter(|v| v.content.as_deref().is_none_or(|c| c == BACKUP_CONTENT))
            .filter_map(|v| normalizer::normalize_backup(v, storage, node))
            .collect())
    }
}

/// Folds one node's view of a pool into the cluster-wide list.
fn merge_pool(pools: &mut Vec<StoragePool>, pool: StoragePool) {
    let Some(existing) = pools.iter_mut().find(|p| p.id == pool.id) else {
        pools.push(pool);
        return;
    };
    if !(existing.shared && pool.shared) {
        existing.total = existing.total.saturating_add(pool.total);
        existing.used = existing.used.saturating_add(pool.used);
        existing.available = existing.available.saturating_add(pool.available);
    }
    for content in pool.content {
        if !existing.content.contains(&content) {
            existing.content.push(content);
        }
    }
    existing.nodes.extend(pool.nodes);
}
