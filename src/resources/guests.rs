use super::{collapse, require_id};
use crate::{
    Dispatch, GuestFilter, GuestKind, GuestListing, NormalizedResource, Operation,
    ProxmoxGateway, ProxmoxResult, ResourceStatus,
    core::application::normalizer::{self, raw::RawResource},
};
use futures::future::join_all;
use tracing::debug;

impl<D: Dispatch> ProxmoxGateway<D> {
    /// Lists guests across the cluster, or on `filter.node` only.
    ///
    /// One call per node and guest kind. A node whose listing fails is
    /// reported in `failures`; the filter is applied to normalized records.
    pub async fn list_guests(&self, filter: &GuestFilter) -> ProxmoxResult<GuestListing> {
        let (nodes, mut failures) = self.fan_out_nodes(filter.node.as_deref()).await?;
        let kinds: Vec<GuestKind> = match filter.kind {
            Some(kind) => vec![kind],
            None => GuestKind::ALL.to_vec(),
        };

        let listings = join_all(nodes.iter().map(|node| {
            let kinds = &kinds;
            async move {
                let calls = kinds.iter().map(|kind| self.node_guests(node, *kind));
                join_all(calls).await
            }
        }))
        .await;

        let mut guests = Vec::new();
        for (node, results) in nodes.iter().zip(listings) {
            let mut errors = Vec::new();
            for (kind, result) in kinds.iter().zip(results) {
                match result {
                    Ok(listed) => guests.extend(listed),
                    Err(e) => errors.push((kind.as_str(), e)),
                }
            }
            failures.extend(collapse(node, &errors));
        }
        guests.retain(|g| filter.matches(g));

        Ok(GuestListing { guests, failures })
    }

    /// Current status of one guest, with its primary IP when available.
    ///
    /// The IP comes from the QEMU guest agent or the container interfaces.
    /// Any failure there, or a guest that is not running, yields `ip: None`.
    pub async fn guest_status(
        &self,
        node: &str,
        kind: GuestKind,
        vmid: u32,
    ) -> ProxmoxResult<NormalizedResource> {
        require_id("node", node)?;
        let raw: RawResource = self
            .fetch_record(&Operation::GuestStatus {
                node: node.to_string(),
                kind,
                vmid,
            })
            .await?;
        let mut guest = normalizer::normalize_resource(
            RawResource {
                vmid: raw.vmid.or(Some(vmid)),
                ..raw
            },
            node,
            kind,
        );

        if guest.status == ResourceStatus::Running {
            let interfaces = self
                .fetch(&Operation::GuestInterfaces {
                    node: node.to_string(),
                    kind,
                    vmid,
                })
                .await;
            guest.ip = match interfaces {
                Ok(payload) => normalizer::extract_primary_ip(kind, &payload),
                Err(e) => {
                    debug!(node, %kind, vmid, error = %e, "no network data for guest");
                    None
                }
            };
        }
        Ok(guest)
    }
}
