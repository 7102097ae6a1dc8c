use super::{
    normalize_percentage, normalize_status,
    raw::{RawNodeStatus, RawResource, RawUsage},
};
use crate::core::domain::{
    model::resource::{NodeDetail, NormalizedResource, ResourceKind, ResourceStatus},
    value_object::{GuestKind, serde_helpers::lenient},
};
use serde_json::Value;
use std::net::IpAddr;

/// Normalizes a guest record listed under `owning_node`.
///
/// The IP is always `None` here; it comes from a separate agent call.
pub(crate) fn normalize_resource(
    raw: RawResource,
    owning_node: &str,
    kind: GuestKind,
) -> NormalizedResource {
    let status = normalize_status(raw.status.as_deref(), raw.qmpstatus.as_deref());
    let vmid = raw.vmid;
    let id = match vmid {
        Some(vmid) => format!("{}/{}", kind, vmid),
        None => format!("{}/unknown", kind),
    };
    let name = raw
        .name
        .or_else(|| vmid.map(|v| format!("{}-{}", kind, v)))
        .unwrap_or_else(|| id.clone());
    NormalizedResource {
        id,
        kind: ResourceKind::from(kind),
        vmid,
        name,
        status,
        cpu: ratio(raw.cpu),
        cpu_count: raw.cpus.or(raw.maxcpu),
        memory_used: raw.mem.unwrap_or(0),
        memory_total: raw.maxmem.unwrap_or(0),
        disk_used: raw.disk.unwrap_or(0),
        disk_total: raw.maxdisk.unwrap_or(0),
        uptime: uptime(raw.uptime, status),
        node: raw.node.unwrap_or_else(|| owning_node.to_string()),
        ip: None,
        tags: raw.tags,
        template: raw.template.unwrap_or(false),
    }
}

/// Normalizes an entry of the `/nodes` listing. Returns `None` when the
/// record carries no node name.
pub(crate) fn normalize_node(raw: RawResource) -> Option<NormalizedResource> {
    let name = raw.node.filter(|n| !n.is_empty())?;
    let status = normalize_status(raw.status.as_deref(), None);
    Some(NormalizedResource {
        id: format!("node/{}", name),
        kind: ResourceKind::Node,
        vmid: None,
        name: name.clone(),
        status,
        cpu: ratio(raw.cpu),
        cpu_count: raw.maxcpu,
        memory_used: raw.mem.unwrap_or(0),
        memory_total: raw.maxmem.unwrap_or(0),
        disk_used: raw.disk.unwrap_or(0),
        disk_total: raw.maxdisk.unwrap_or(0),
        uptime: uptime(raw.uptime, status),
        node: name,
        ip: None,
        tags: Vec::new(),
        template: false,
    })
}

/// Normalizes `/nodes/{node}/status`. A node answering at all is running.
pub(crate) fn normalize_node_detail(raw: RawNodeStatus, node: &str) -> NodeDetail {
    let memory = raw.memory.unwrap_or_default();
    let rootfs = raw.rootfs.unwrap_or_default();
    let swap = raw.swap.unwrap_or_default();
    let cpuinfo = raw.cpuinfo.unwrap_or_default();
    let status = ResourceStatus::Running;

    let load: Vec<f64> = raw
        .loadavg
        .iter()
        .filter_map(|l| l.trim().parse::<f64>().ok())
        .collect();
    let load_average = match load.as_slice() {
        [one, five, fifteen, ..] => Some([*one, *five, *fifteen]),
        _ => None,
    };

    NodeDetail {
        resource: NormalizedResource {
            id: format!("node/{}", node),
            kind: ResourceKind::Node,
            vmid: None,
            name: node.to_string(),
            status,
            cpu: ratio(raw.cpu),
            cpu_count: cpuinfo.cpus,
            memory_used: used(&memory),
            memory_total: total(&memory),
            disk_used: used(&rootfs),
            disk_total: total(&rootfs),
            uptime: uptime(raw.uptime, status),
            node: node.to_string(),
            ip: None,
            tags: Vec::new(),
            template: false,
        },
        load_average,
        io_wait: raw.wait.map(|w| normalize_percentage(w, 1.0)),
        kernel_version: raw.kversion,
        pve_version: raw.pveversion,
        cpu_model: cpuinfo.model,
        swap_used: used(&swap),
        swap_total: total(&swap),
    }
}

/// Picks the primary address from a guest agent (`network-get-interfaces`)
/// or container (`interfaces`) payload.
///
/// Loopback and link-local addresses are ignored; IPv4 is preferred. Any
/// payload without a usable address yields `None`.
pub(crate) fn extract_primary_ip(kind: GuestKind, payload: &Value) -> Option<String> {
    let mut candidates: Vec<IpAddr> = Vec::new();
    match kind {
        GuestKind::Qemu => {
            // The agent wraps its answer in `result`; older versions do not.
            let interfaces = payload.get("result").unwrap_or(payload);
            for iface in interfaces.as_array().into_iter().flatten() {
                if iface.get("name").and_then(Value::as_str) == Some("lo") {
                    continue;
                }
                let addresses = iface.get("ip-addresses").and_then(Value::as_array);
                for address in addresses.into_iter().flatten() {
                    if let Some(ip) = address.get("ip-address").and_then(lenient::text) {
                        candidates.extend(parse_ip(&ip));
                    }
                }
            }
        }
        GuestKind::Lxc => {
            for iface in payload.as_array().into_iter().flatten() {
                if iface.get("name").and_then(Value::as_str) == Some("lo") {
                    continue;
                }
                for key in ["inet", "inet6"] {
                    if let Some(ip) = iface.get(key).and_then(lenient::text) {
                        candidates.extend(parse_ip(&ip));
                    }
                }
            }
        }
    }

    candidates.retain(|ip| !ip.is_loopback() && !is_link_local(ip) && !ip.is_unspecified());
    candidates
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| candidates.first())
        .map(IpAddr::to_string)
}

/// Accepts `10.0.0.5` as well as `10.0.0.5/24`.
fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.split('/').next()?.trim().parse().ok()
}

fn is_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

fn ratio(cpu: Option<f64>) -> f64 {
    cpu.map(|c| normalize_percentage(c, 1.0)).unwrap_or(0.0)
}

/// Stopped resources report stale uptimes on some versions.
fn uptime(raw: Option<u64>, status: ResourceStatus) -> u64 {
    match status {
        ResourceStatus::Stopped => 0,
        _ => raw.unwrap_or(0),
    }
}

fn used(usage: &RawUsage) -> u64 {
    usage.used.unwrap_or(0)
}

fn total(usage: &RawUsage) -> u64 {
    usage.total.unwrap_or(0)
}
