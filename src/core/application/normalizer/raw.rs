//! Raw record shapes, one per remote payload.
//!
//! Every field is optional and read through the lenient deserializers, so a
//! record object always deserializes; only a non-object entry is dropped.

use crate::core::domain::value_object::serde_helpers::lenient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Reads a list payload, skipping entries that are not records.
pub(crate) fn records<T: DeserializeOwned>(payload: Value) -> Vec<T> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(error = %e, "skipping malformed record");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Reads a single-object payload, falling back to an empty record.
pub(crate) fn record<T: DeserializeOwned + Default>(payload: Value) -> T {
    serde_json::from_value(payload).unwrap_or_default()
}

/// A node or guest from `/nodes`, `/nodes/{node}/{qemu,lxc}` or a guest's
/// `status/current`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawResource {
    #[serde(default, deserialize_with = "lenient::string")]
    pub node: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub vmid: Option<u32>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub qmpstatus: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub maxcpu: Option<u32>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub cpus: Option<u32>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub mem: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub maxmem: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub disk: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub maxdisk: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub uptime: Option<u64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub template: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawUsage {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub used: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawCpuInfo {
    #[serde(default, deserialize_with = "lenient::string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub cpus: Option<u32>,
}

/// `/nodes/{node}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawNodeStatus {
    #[serde(default, deserialize_with = "lenient::f64")]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub wait: Option<f64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub uptime: Option<u64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub loadavg: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub kversion: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub pveversion: Option<String>,
    #[serde(default, deserialize_with = "optional")]
    pub cpuinfo: Option<RawCpuInfo>,
    #[serde(default, deserialize_with = "optional")]
    pub memory: Option<RawUsage>,
    #[serde(default, deserialize_with = "optional")]
    pub swap: Option<RawUsage>,
    #[serde(default, deserialize_with = "optional")]
    pub rootfs: Option<RawUsage>,
}

/// An entry of `/cluster/status`: either the cluster itself or a member node.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawClusterStatus {
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub entry_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub quorate: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawVersion {
    #[serde(default, deserialize_with = "lenient::string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub release: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub repoid: Option<String>,
}

/// Node view of a pool (`/nodes/{node}/storage`) and cluster storage
/// definitions (`/storage`) share one shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawStorage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub storage: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub plugin: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub content: Vec<String>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub used: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub avail: Option<u64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub disable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub shared: Option<bool>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub server: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub portal: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub export: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub share: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub target: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub path: Option<String>,
}

/// A volume from `/nodes/{node}/storage/{storage}/content`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawVolume {
    #[serde(default, deserialize_with = "lenient::string")]
    pub volid: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub ctime: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub vmid: Option<u32>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub protected: Option<bool>,
}

/// A task from `/nodes/{node}/tasks` or `/cluster/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawTask {
    #[serde(default, deserialize_with = "lenient::string")]
    pub upid: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub task_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub starttime: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub endtime: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub node: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user: Option<String>,
    /// The task object id; a vmid for guest tasks.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
}

/// An entry of `/cluster/log`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawLogEntry {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub time: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub node: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub pri: Option<u32>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub msg: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSnapshot {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub snaptime: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub parent: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub vmstate: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawUser {
    #[serde(default, deserialize_with = "lenient::string")]
    pub userid: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub enable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub expire: Option<u64>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub firstname: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRole {
    #[serde(default, deserialize_with = "lenient::string")]
    pub roleid: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub privs: Vec<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub special: Option<bool>,
}

/// An interface from `/nodes/{node}/network`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawInterface {
    #[serde(default, deserialize_with = "lenient::string")]
    pub iface: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub autostart: Option<bool>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub cidr: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub netmask: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub gateway: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub bridge_ports: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub slaves: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawFirewallRule {
    #[serde(default, deserialize_with = "lenient::u32")]
    pub pos: Option<u32>,
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub enable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub dest: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub proto: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub dport: Option<String>,
    #[serde(default, rename = "macro", deserialize_with = "lenient::string")]
    pub macro_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawFirewallOptions {
    #[serde(default, deserialize_with = "lenient::bool")]
    pub enable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub policy_in: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub policy_out: Option<String>,
}

/// One RRD sample. Nodes and guests name the memory and disk series
/// differently, so both spellings are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRrdPoint {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub time: Option<u64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub memused: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub memtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub rootused: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub roottotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub mem: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub maxmem: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub disk: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub maxdisk: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub netin: Option<f64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub netout: Option<f64>,
}

/// Nested objects of the wrong shape read as `None` instead of failing the
/// whole record.
fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
