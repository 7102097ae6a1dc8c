//! Aggregation operations of [`ProxmoxGateway`](crate::ProxmoxGateway), one
//! module per resource family.

mod access;
mod cluster;
mod guests;
mod history;
mod network;
mod snapshots;
mod storage;
mod tasks;

use crate::{
    Dispatch, NormalizedResource, Operation, PartialFailure, ProxmoxError, ProxmoxGateway,
    ProxmoxResult, ResourceStatus, core::application::normalizer,
};
use tracing::warn;

/// Rejects a node or storage identifier that is empty or would not stay a
/// single path segment, before any remote call.
pub(crate) fn require_id(field: &str, value: &str) -> ProxmoxResult<()> {
    if value.trim().is_empty() {
        return Err(ProxmoxError::field(field, "Cannot be empty"));
    }
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(ProxmoxError::field(field, "Must be a single path segment"));
    }
    Ok(())
}

/// Folds every failed sub-call of one fan-out member into a single entry.
///
/// The cause is the kind of the first failure; the message lists each
/// failed sub-call as `label: message`.
pub(crate) fn collapse(target: &str, errors: &[(&str, ProxmoxError)]) -> Option<PartialFailure> {
    let (_, first) = errors.first()?;
    let message = errors
        .iter()
        .map(|(label, e)| format!("{}: {}", label, e.message()))
        .collect::<Vec<_>>()
        .join("; ");
    warn!(target_member = target, cause = %first.kind(), %message, "partial failure");
    Some(PartialFailure {
        target: target.to_string(),
        cause: first.kind(),
        message,
    })
}

/// The failure recorded for a node the listing reports as not running.
pub(crate) fn unavailable(node: &NormalizedResource) -> PartialFailure {
    let error = ProxmoxError::Connectivity(format!("node is {}", node.status));
    warn!(node = %node.name, status = %node.status, "skipping unavailable node");
    PartialFailure::new(node.name.clone(), &error)
}

impl<D: Dispatch> ProxmoxGateway<D> {
    /// All nodes in cluster listing order.
    pub(crate) async fn fetch_nodes(&self) -> ProxmoxResult<Vec<NormalizedResource>> {
        Ok(self
            .fetch_records(&Operation::Nodes)
            .await?
            .into_iter()
            .filter_map(normalizer::normalize_node)
            .collect())
    }

    /// The names of the running nodes to fan out over, plus a failure for
    /// every node that is not. With `only` set, that node is used as is.
    pub(crate) async fn fan_out_nodes(
        &self,
        only: Option<&str>,
    ) -> ProxmoxResult<(Vec<String>, Vec<PartialFailure>)> {
        if let Some(node) = only {
            require_id("node", node)?;
            return Ok((vec![node.to_string()], Vec::new()));
        }
        let mut names = Vec::new();
        let mut failures = Vec::new();
        for node in self.fetch_nodes().await? {
            if node.status == ResourceStatus::Running {
                names.push(node.name);
            } else {
                failures.push(unavailable(&node));
            }
        }
        Ok((names, failures))
    }
}
