use super::{collapse, require_id, unavailable};
use crate::{
    ApiVersion, CapacityTotals, ClusterSummary, CpuTotals, Dispatch, GuestCounts, GuestKind,
    NodeDetail, NodeSummary, NormalizedResource, Operation, PartialFailure, ProxmoxError,
    ProxmoxGateway, ProxmoxResult, ResourceStatus,
    core::application::normalizer::{
        self, normalize_percentage,
        raw::{RawClusterStatus, RawNodeStatus, RawResource, RawVersion},
    },
};
use futures::future::join_all;
use tracing::{debug, instrument};

/// What one node contributed to the summary.
struct NodeFanOut {
    detail: Option<NodeDetail>,
    guests: Vec<NormalizedResource>,
    errors: Vec<(&'static str, ProxmoxError)>,
}

impl<D: Dispatch> ProxmoxGateway<D> {
    /// The API version of the cluster.
    pub async fn version(&self) -> ProxmoxResult<ApiVersion> {
        let raw: RawVersion = self.fetch_record(&Operation::Version).await?;
        Ok(ApiVersion {
            version: raw.version.unwrap_or_else(|| "unknown".to_string()),
            release: raw.release.unwrap_or_default(),
            repoid: raw.repoid,
        })
    }

    /// Lists the cluster nodes in cluster listing order.
    pub async fn list_nodes(&self) -> ProxmoxResult<Vec<NormalizedResource>> {
        self.fetch_nodes().await
    }

    /// Detailed status of one node.
    pub async fn node_status(&self, node: &str) -> ProxmoxResult<NodeDetail> {
        require_id("node", node)?;
        let raw: RawNodeStatus = self
            .fetch_record(&Operation::NodeStatus {
                node: node.to_string(),
            })
            .await?;
        Ok(normalizer::normalize_node_detail(raw, node))
    }

    /// Cluster-wide health: every node with its guests, totals and quorum.
    ///
    /// Only the node listing is required. Every other sub-call may fail; a
    /// failing node keeps its slot with a warning and appears once in
    /// `failures`, and nodes the listing reports as down are not queried.
    #[instrument(skip(self), fields(host = self.endpoint().host().as_str()))]
    pub async fn cluster_summary(&self) -> ProxmoxResult<ClusterSummary> {
        let nodes = self.fetch_nodes().await?;
        debug!(nodes = nodes.len(), "fanning out");

        let status_call = self.fetch_records::<RawClusterStatus>(&Operation::ClusterStatus);
        let node_calls = join_all(nodes.iter().map(|node| async move {
            if node.status == ResourceStatus::Running {
                Some(self.node_fan_out(&node.name).await)
            } else {
                None
            }
        }));
        let (status, fan_outs) = futures::join!(status_call, node_calls);

        let mut failures = Vec::new();
        let (cluster_name, quorate) = match status {
            Ok(entries) => quorum(&entries),
            Err(e) => {
                failures.push(PartialFailure::new("cluster", &e));
                (None, None)
            }
        };

        let mut slots = Vec::with_capacity(nodes.len());
        let mut guest_counts = GuestCounts::default();
        for (listed, fan_out) in nodes.into_iter().zip(fan_outs) {
            let slot = match fan_out {
                None => {
                    let failure = unavailable(&listed);
                    failures.push(failure.clone());
                    NodeSummary {
                        node: listed,
                        guests: Vec::new(),
                        warning: Some(failure),
                    }
                }
                Some(fan_out) => {
                    let warning = collapse(&listed.name, &fan_out.errors);
                    failures.extend(warning.clone());
                    let node = match fan_out.detail {
                        Some(detail) => merge_detail(listed, detail),
                        None => listed,
                    };
                    NodeSummary {
                        node,
                        guests: fan_out.guests,
                        warning,
                    }
                }
            };
            for guest in &slot.guests {
                guest_counts.record(guest.status);
            }
            slots.push(slot);
        }

        Ok(ClusterSummary {
            cluster_name,
            quorate,
            cpu: cpu_totals(&slots),
            memory: capacity(slots.iter().map(|s| (s.node.memory_used, s.node.memory_total))),
            disk: capacity(slots.iter().map(|s| (s.node.disk_used, s.node.disk_total))),
            nodes: slots,
            guest_counts,
            failures,
        })
    }

    /// Node status plus both guest listings of one node, concurrently.
    async fn node_fan_out(&self, node: &str) -> NodeFanOut {
        let status_op = Operation::NodeStatus {
            node: node.to_string(),
        };
        let status = self.fetch_record::<RawNodeStatus>(&status_op);
        let qemu = self.node_guests(node, GuestKind::Qemu);
        let lxc = self.node_guests(node, GuestKind::Lxc);
        let (status, qemu, lxc) = futures::join!(status, qemu, lxc);

        let mut fan_out = NodeFanOut {
            detail: None,
            guests: Vec::new(),
            errors: Vec::new(),
        };
        match status {
            Ok(raw) => fan_out.detail = Some(normalizer::normalize_node_detail(raw, node)),
            Err(e) => fan_out.errors.push(("status", e)),
        }
        for (label, listing) in [("qemu", qemu), ("lxc", lxc)] {
            match listing {
                Ok(guests) => fan_out.guests.extend(guests),
                Err(e) => fan_out.errors.push((label, e)),
            }
        }
        fan_out
    }

    /// The guests of one kind on one node, in listing order.
    pub(crate) async fn node_guests(
        &self,
        node: &str,
        kind: GuestKind,
    ) -> ProxmoxResult<Vec<NormalizedResource>> {
        let raw: Vec<RawResource> = self
            .fetch_records(&Operation::NodeGuests {
                node: node.to_string(),
                kind,
            })
            .await?;
        Ok(raw
            .into_iter()
            .map(|r| normalizer::normalize_resource(r, node, kind))
            .collect())
    }
}

/// Cluster name and quorum flag. A standalone node has no cluster entry and
/// is trivially quorate.
fn quorum(entries: &[RawClusterStatus]) -> (Option<String>, Option<bool>) {
    match entries
        .iter()
        .find(|e| e.entry_type.as_deref() == Some("cluster"))
    {
        Some(cluster) => (cluster.name.clone(), Some(cluster.quorate.unwrap_or(false))),
        None => (None, Some(true)),
    }
}

/// Prefers the live status figures over the listing, keeping the listing's
/// identity and whatever the status call did not report.
fn merge_detail(listed: NormalizedResource, detail: NodeDetail) -> NormalizedResource {
    let live = detail.resource;
    NormalizedResource {
        cpu: live.cpu,
        cpu_count: live.cpu_count.or(listed.cpu_count),
        memory_used: live.memory_used,
        memory_total: if live.memory_total > 0 {
            live.memory_total
        } else {
            listed.memory_total
        },
        disk_used: live.disk_used,
        disk_total: if live.disk_total > 0 {
            live.disk_total
        } else {
            listed.disk_total
        },
        uptime: live.uptime.max(listed.uptime),
        ..listed
    }
}

fn cpu_totals(slots: &[NodeSummary]) -> CpuTotals {
    let mut cores = 0u32;
    let mut used_cores = 0.0;
    for slot in slots {
        if let Some(count) = slot.node.cpu_count {
            cores = cores.saturating_add(count);
            used_cores += slot.node.cpu * f64::from(count);
        }
    }
    CpuTotals {
        cores,
        used_cores,
        ratio: normalize_percentage(used_cores, f64::from(cores)),
    }
}

fn capacity(pairs: impl Iterator<Item = (u64, u64)>) -> CapacityTotals {
    let (used, total) = pairs.fold((0u64, 0u64), |(u, t), (used, total)| {
        (u.saturating_add(used), t.saturating_add(total))
    });
    CapacityTotals {
        used,
        total,
        ratio: normalize_percentage(used as f64, total as f64),
    }
}
