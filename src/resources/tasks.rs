use super::require_id;
use crate::{
    ClusterEvent, Dispatch, Operation, ProxmoxError, ProxmoxGateway, ProxmoxResult, TaskFilter,
    TaskListing, TaskRecord,
    core::application::normalizer::{
        self,
        raw::{RawLogEntry, RawTask},
    },
};

impl<D: Dispatch> ProxmoxGateway<D> {
    /// Recent tasks of one node, or of the whole cluster.
    ///
    /// The filter is applied to normalized records and `limit` last, so a
    /// status filter never sees a pre-truncated list.
    pub async fn recent_tasks(&self, filter: &TaskFilter) -> ProxmoxResult<TaskListing> {
        if filter.limit == Some(0) {
            return Err(ProxmoxError::field("limit", "Must be greater than zero"));
        }

        let (operation, node) = match filter.node.as_deref() {
            Some(node) => {
                require_id("node", node)?;
                let op = Operation::NodeTasks {
                    node: node.to_string(),
                    limit: filter.limit.filter(|_| filter.status.is_none()),
                    vmid: filter.vmid,
                };
                (op, Some(node))
            }
            None => (Operation::ClusterTasks, None),
        };

        let raw: Vec<RawTask> = self.fetch_records(&operation).await?;
        let mut tasks: Vec<TaskRecord> = raw
            .into_iter()
            .filter_map(|t| normalizer::normalize_task(t, node))
            .filter(|t| filter.matches(t))
            .collect();
        if let Some(limit) = filter.limit {
            tasks.truncate(limit);
        }

        Ok(TaskListing {
            tasks,
            failures: Vec::new(),
        })
    }

    /// The cluster event log, newest first as the cluster reports it.
    pub async fn cluster_log(&self, max: Option<usize>) -> ProxmoxResult<Vec<ClusterEvent>> {
        if max == Some(0) {
            return Err(ProxmoxError::field("max", "Must be greater than zero"));
        }
        let raw: Vec<RawLogEntry> = self.fetch_records(&Operation::ClusterLog { max }).await?;
        let mut events: Vec<ClusterEvent> = raw
            .into_iter()
            .map(normalizer::normalize_cluster_event)
            .collect();
        if let Some(max) = max {
            events.truncate(max);
        }
        Ok(events)
    }
}
