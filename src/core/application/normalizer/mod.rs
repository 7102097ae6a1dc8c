//! Pure conversions from raw API payloads into the normalized model.
//!
//! Nothing in here performs I/O and nothing in here fails: malformed or
//! missing input degrades to `Unknown`, zero or `None`.

mod activity;
mod history;
mod inventory;
pub(crate) mod raw;
mod resource;
mod storage;

pub(crate) use activity::{normalize_cluster_event, normalize_task};
pub(crate) use history::bucket_points;
pub(crate) use inventory::{
    normalize_firewall_rule, normalize_interface, normalize_role, normalize_snapshots,
    normalize_user,
};
pub(crate) use raw::records;
pub(crate) use resource::{
    extract_primary_ip, normalize_node, normalize_node_detail, normalize_resource,
};
pub(crate) use storage::{normalize_backup, normalize_storage, remote_mount};

use crate::core::domain::model::resource::ResourceStatus;
use serde::Serialize;
use std::fmt;

/// Binary (1024-based) display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ByteUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
    EB,
}

impl ByteUnit {
    const ALL: [ByteUnit; 7] = [
        ByteUnit::B,
        ByteUnit::KB,
        ByteUnit::MB,
        ByteUnit::GB,
        ByteUnit::TB,
        ByteUnit::PB,
        ByteUnit::EB,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ByteUnit::B => "B",
            ByteUnit::KB => "KB",
            ByteUnit::MB => "MB",
            ByteUnit::GB => "GB",
            ByteUnit::TB => "TB",
            ByteUnit::PB => "PB",
            ByteUnit::EB => "EB",
        }
    }
}

impl fmt::Display for ByteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A byte count scaled for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ByteSize {
    pub value: f64,
    pub unit: ByteUnit,
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            ByteUnit::B => write!(f, "{} B", self.value.trunc()),
            unit => write!(f, "{:.2} {}", self.value, unit),
        }
    }
}

/// Largest scaled value that still renders below 1024 at two decimals.
const MAX_SCALED: f64 = 1023.99;

/// Scales a byte count to the largest unit that keeps the value below 1024.
///
/// Zero, negative and non-finite input all yield `0 B`. Counts beyond the
/// EB range saturate at `1023.99 EB`.
#[must_use]
pub fn normalize_bytes(raw: f64) -> ByteSize {
    if !raw.is_finite() || raw <= 0.0 {
        return ByteSize {
            value: 0.0,
            unit: ByteUnit::B,
        };
    }
    let mut value = raw;
    let mut unit = ByteUnit::B;
    for next in ByteUnit::ALL.iter().skip(1) {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = *next;
    }
    // EB is the last unit; larger counts saturate there.
    ByteSize {
        value: value.min(MAX_SCALED),
        unit,
    }
}

/// Renders uptime as `"{d}d {h}h {m}m"`; zero uptime or a stopped resource is `"offline"`.
#[must_use]
pub fn normalize_uptime(seconds: u64, status: ResourceStatus) -> String {
    if seconds == 0 || status == ResourceStatus::Stopped {
        return "offline".to_string();
    }
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

/// `used / total` clamped to `[0, 1]`; exactly 0 when `total <= 0`.
#[must_use]
pub fn normalize_percentage(used: f64, total: f64) -> f64 {
    if !used.is_finite() || !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    (used / total).clamp(0.0, 1.0)
}

/// Maps the status vocabulary of nodes and guests onto [`ResourceStatus`].
///
/// A QEMU guest reports `running` while its `qmpstatus` says `paused`; the
/// latter wins.
#[must_use]
pub fn normalize_status(status: Option<&str>, qmp_status: Option<&str>) -> ResourceStatus {
    let parse = |raw: &str| match raw.trim().to_ascii_lowercase().as_str() {
        "running" | "online" => ResourceStatus::Running,
        "stopped" | "offline" | "shutdown" => ResourceStatus::Stopped,
        "paused" | "suspended" | "prelaunch" | "suspending" => ResourceStatus::Paused,
        _ => ResourceStatus::Unknown,
    };
    match (status.map(parse), qmp_status.map(parse)) {
        (Some(ResourceStatus::Running), Some(ResourceStatus::Paused)) => ResourceStatus::Paused,
        (Some(status), _) => status,
        (None, Some(qmp)) => qmp,
        (None, None) => ResourceStatus::Unknown,
    }
}
