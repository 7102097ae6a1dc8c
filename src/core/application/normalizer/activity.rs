use super::raw::{RawLogEntry, RawTask};
use crate::core::domain::{
    model::task::{ClusterEvent, TaskRecord, TaskStatus},
    value_object::serde_helpers::epoch,
};

/// Normalizes a task log entry. Tasks without a UPID are dropped.
///
/// A task with neither an exit status nor an end time is still running.
pub(crate) fn normalize_task(raw: RawTask, fallback_node: Option<&str>) -> Option<TaskRecord> {
    let id = raw.upid.filter(|u| !u.is_empty())?;
    let status = task_status(raw.status.as_deref(), raw.endtime);
    Some(TaskRecord {
        task_type: raw
            .task_type
            .or_else(|| upid_field(&id, 5))
            .unwrap_or_else(|| "unknown".to_string()),
        status,
        exit_status: raw.status,
        started_at: epoch(raw.starttime),
        ended_at: epoch(raw.endtime),
        node: raw
            .node
            .or_else(|| upid_field(&id, 1))
            .or_else(|| fallback_node.map(str::to_string))
            .unwrap_or_default(),
        user: raw.user,
        guest_id: raw.id.and_then(|id| id.trim().parse().ok()),
        id,
    })
}

fn task_status(exit: Option<&str>, ended: Option<u64>) -> TaskStatus {
    match exit.map(str::trim) {
        None | Some("") if ended.is_none() => TaskStatus::Running,
        Some(s) if s.eq_ignore_ascii_case("running") => TaskStatus::Running,
        Some("OK") => TaskStatus::Ok,
        Some(s) if s.starts_with("WARNINGS") => TaskStatus::Warning,
        _ => TaskStatus::Error,
    }
}

/// `UPID:{node}:{pid}:{pstart}:{starttime}:{type}:{id}:{user}:`
fn upid_field(upid: &str, index: usize) -> Option<String> {
    upid.split(':')
        .nth(index)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
}

pub(crate) fn normalize_cluster_event(raw: RawLogEntry) -> ClusterEvent {
    ClusterEvent {
        time: epoch(raw.time),
        node: raw.node.unwrap_or_default(),
        user: raw.user,
        severity: raw.pri.and_then(|p| u8::try_from(p).ok()).filter(|p| *p <= 7),
        tag: raw.tag,
        message: raw.msg.unwrap_or_default(),
    }
}
