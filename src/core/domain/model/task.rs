//! Task and cluster event history.

use crate::core::domain::value_object::serde_helpers::optional_system_time;
use serde::Serialize;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Ok,
    Error,
    Warning,
}

/// One entry of a node or cluster task log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    /// The task UPID.
    pub id: String,
    /// Task type, e.g. `vzdump`, `qmstart`.
    pub task_type: String,
    pub status: TaskStatus,
    /// Exit status text as reported (`OK`, `WARNINGS: 2`, an error message).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<String>,
    #[serde(with = "optional_system_time")]
    pub started_at: Option<SystemTime>,
    #[serde(with = "optional_system_time")]
    pub ended_at: Option<SystemTime>,
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Guest the task acted on, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<u32>,
}

/// An entry of the cluster log (`/cluster/log`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterEvent {
    #[serde(with = "optional_system_time")]
    pub time: Option<SystemTime>,
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Syslog severity (0 = emergency ... 7 = debug), when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub message: String,
}
