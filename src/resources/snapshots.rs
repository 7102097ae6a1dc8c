use super::require_id;
use crate::{
    Dispatch, GuestFilter, GuestKind, GuestSnapshots, Operation, PartialFailure, ProxmoxGateway,
    ProxmoxResult, Snapshot, SnapshotListing,
    core::application::normalizer::{self, raw::RawSnapshot},
};
use futures::future::join_all;

impl<D: Dispatch> ProxmoxGateway<D> {
    /// Snapshots of one guest, oldest first.
    pub async fn guest_snapshots(
        &self,
        node: &str,
        kind: GuestKind,
        vmid: u32,
    ) -> ProxmoxResult<Vec<Snapshot>> {
        require_id("node", node)?;
        let raw: Vec<RawSnapshot> = self
            .fetch_records(&Operation::GuestSnapshots {
                node: node.to_string(),
                kind,
                vmid,
            })
            .await?;
        Ok(normalizer::normalize_snapshots(raw))
    }

    /// Snapshots of every guest matching `filter`, in guest listing order.
    ///
    /// Listing failures and per-guest failures are both partial.
    pub async fn snapshot_inventory(&self, filter: &GuestFilter) -> ProxmoxResult<SnapshotListing> {
        let listing = self.list_guests(filter).await?;
        let mut failures = listing.failures;

        let targets: Vec<_> = listing
            .guests
            .into_iter()
            .filter_map(|g| Some((g.node, g.kind.guest_kind()?, g.vmid?, g.name)))
            .collect();
        let results = join_all(
            targets
                .iter()
                .map(|(node, kind, vmid, _)| self.guest_snapshots(node, *kind, *vmid)),
        )
        .await;

        let mut guests = Vec::new();
        for ((node, kind, vmid, name), result) in targets.into_iter().zip(results) {
            match result {
                Ok(snapshots) => guests.push(GuestSnapshots {
                    node,
                    kind,
                    vmid,
                    name,
                    snapshots,
                }),
                Err(e) => failures.push(PartialFailure::new(format!("{}/{}", kind, vmid), &e)),
            }
        }
        Ok(SnapshotListing { guests, failures })
    }
}
