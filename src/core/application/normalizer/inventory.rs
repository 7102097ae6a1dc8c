use super::raw::{RawFirewallRule, RawInterface, RawRole, RawSnapshot, RawUser};
use crate::core::domain::{
    model::{
        access::{RoleRecord, UserRecord},
        network::{FirewallRule, NetworkInterface},
        snapshot::Snapshot,
    },
    value_object::serde_helpers::epoch,
};

/// Proxmox lists the live state as a pseudo-snapshot named `current`.
const CURRENT_STATE: &str = "current";

/// Normalizes a snapshot listing: drops `current`, sorts by creation time
/// with unknown times last.
pub(crate) fn normalize_snapshots(raw: Vec<RawSnapshot>) -> Vec<Snapshot> {
    let mut snapshots: Vec<Snapshot> = raw
        .into_iter()
        .filter_map(|s| {
            let name = s.name.filter(|n| !n.is_empty() && n != CURRENT_STATE)?;
            Some(Snapshot {
                name,
                description: s.description.map(|d| d.trim().to_string()),
                created_at: epoch(s.snaptime),
                parent: s.parent,
                includes_ram: s.vmstate.unwrap_or(false),
            })
        })
        .collect();
    // Stable sort keeps listing order among equal times.
    snapshots.sort_by_key(|s| (s.created_at.is_none(), s.created_at));
    snapshots
}

pub(crate) fn normalize_user(raw: RawUser) -> Option<UserRecord> {
    let id = raw.userid.filter(|u| !u.is_empty())?;
    let realm = id
        .rsplit_once('@')
        .map(|(_, realm)| realm.to_string())
        .unwrap_or_default();
    let display_name = match (raw.firstname, raw.lastname) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        (first, last) => first.or(last),
    };
    Some(UserRecord {
        id,
        realm,
        enabled: raw.enable.unwrap_or(true),
        expires_at: epoch(raw.expire),
        display_name,
        email: raw.email,
        groups: raw.groups,
    })
}

pub(crate) fn normalize_role(raw: RawRole) -> Option<RoleRecord> {
    let id = raw.roleid.filter(|r| !r.is_empty())?;
    let mut privileges = raw.privs;
    privileges.sort();
    Some(RoleRecord {
        id,
        privileges,
        built_in: raw.special.unwrap_or(false),
    })
}

pub(crate) fn normalize_interface(raw: RawInterface) -> Option<NetworkInterface> {
    let name = raw.iface.filter(|i| !i.is_empty())?;
    let cidr = raw.cidr.or_else(|| match (&raw.address, &raw.netmask) {
        (Some(address), Some(mask)) => Some(format!("{}/{}", address, mask)),
        (Some(address), None) => Some(address.clone()),
        _ => None,
    });
    let ports = if raw.bridge_ports.is_empty() {
        raw.slaves
    } else {
        raw.bridge_ports
    };
    Some(NetworkInterface {
        name,
        kind: raw.kind.unwrap_or_else(|| "unknown".to_string()),
        active: raw.active.unwrap_or(false),
        autostart: raw.autostart.unwrap_or(false),
        cidr,
        gateway: raw.gateway,
        ports,
        comment: raw.comments.map(|c| c.trim().to_string()),
    })
}

/// Rules without a position take their index in the listing.
pub(crate) fn normalize_firewall_rule(raw: RawFirewallRule, index: usize) -> FirewallRule {
    FirewallRule {
        position: raw
            .pos
            .unwrap_or_else(|| u32::try_from(index).unwrap_or(u32::MAX)),
        direction: raw.direction.unwrap_or_else(|| "in".to_string()),
        action: raw.action.unwrap_or_default(),
        enabled: raw.enable.unwrap_or(false),
        source: raw.source,
        dest: raw.dest,
        protocol: raw.proto,
        dport: raw.dport,
        macro_name: raw.macro_name,
        comment: raw.comment,
    }
}
