use crate::core::domain::value_object::Timeframe;
use serde::Serialize;

/// One bucket of a historical statistics series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// Bucket start, seconds since UNIX epoch.
    pub timestamp: u64,
    /// CPU utilization ratio in `[0, 1]`.
    pub cpu: f64,
    pub memory_used: u64,
    pub memory_total: u64,
    pub disk_used: u64,
    pub disk_total: u64,
    /// Network throughput in bytes per second (guests only report these).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_in: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_out: Option<f64>,
}

/// What a historical statistics query targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum StatsTarget {
    Node {
        node: String,
    },
    Guest {
        node: String,
        kind: crate::core::domain::value_object::GuestKind,
        vmid: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySeries {
    pub target: StatsTarget,
    pub timeframe: Timeframe,
    pub points: Vec<HistoryPoint>,
    /// Raw points dropped because cpu, memory or disk was missing.
    pub skipped: usize,
}
