use super::require_id;
use crate::{
    Dispatch, HistorySeries, Operation, ProxmoxGateway, ProxmoxResult, StatsTarget, Timeframe,
    core::application::normalizer::{self, raw::RawRrdPoint},
};
use tracing::debug;

impl<D: Dispatch> ProxmoxGateway<D> {
    /// Historical usage of a node or guest over `timeframe`.
    ///
    /// The timeframe is parsed before anything else; an unknown one is a
    /// `ValidationError` and no remote call is made. Incomplete samples are
    /// skipped and counted.
    pub async fn historical_stats(
        &self,
        target: StatsTarget,
        timeframe: &str,
    ) -> ProxmoxResult<HistorySeries> {
        let timeframe: Timeframe = timeframe.parse()?;
        let operation = match &target {
            StatsTarget::Node { node } => {
                require_id("node", node)?;
                Operation::NodeRrd {
                    node: node.clone(),
                    timeframe,
                }
            }
            StatsTarget::Guest { node, kind, vmid } => {
                require_id("node", node)?;
                Operation::GuestRrd {
                    node: node.clone(),
                    kind: *kind,
                    vmid: *vmid,
                    timeframe,
                }
            }
        };

        let raw: Vec<RawRrdPoint> = self.fetch_records(&operation).await?;
        let (points, skipped) = normalizer::bucket_points(raw, timeframe);
        if skipped > 0 {
            debug!(%operation, skipped, "incomplete samples skipped");
        }
        Ok(HistorySeries {
            target,
            timeframe,
            points,
            skipped,
        })
    }
}
