use crate::{
    ErrorKind, ProxmoxError, ResourceStatus,
    tests::support::{
        create_test_gateway, guest_record, mount_data, mount_status, node_record,
    },
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// Mounts a healthy node: status plus one QEMU and one LXC guest.
async fn mount_healthy_node(server: &MockServer, node: &str, first_vmid: u32) {
    mount_data(
        server,
        &format!("/api2/json/nodes/{}/status", node),
        json!({
            "cpu": 0.5,
            "uptime": 90061,
            "loadavg": ["0.10", "0.20", "0.30"],
            "cpuinfo": {"cpus": 8, "model": "Intel Xeon"},
            "memory": {"used": 8589934592u64, "total": 17179869184u64},
            "rootfs": {"used": 10737418240u64, "total": 107374182400u64}
        }),
    )
    .await;
    mount_data(
        server,
        &format!("/api2/json/nodes/{}/qemu", node),
        json!([
            guest_record(first_vmid, "web", "running"),
            guest_record(first_vmid + 1, "db", "stopped")
        ]),
    )
    .await;
    mount_data(
        server,
        &format!("/api2/json/nodes/{}/lxc", node),
        json!([guest_record(first_vmid + 50, "proxy", "running")]),
    )
    .await;
}

async fn mount_quorate_cluster(server: &MockServer) {
    mount_data(
        server,
        "/api2/json/cluster/status",
        json!([
            {"type": "cluster", "name": "lab", "quorate": 1, "nodes": 3},
            {"type": "node", "name": "pve1", "online": 1}
        ]),
    )
    .await;
}

#[tokio::test]
async fn test_cluster_summary_success() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes",
        json!([node_record("pve1", "online"), node_record("pve2", "online")]),
    )
    .await;
    mount_quorate_cluster(&server).await;
    mount_healthy_node(&server, "pve1", 100).await;
    mount_healthy_node(&server, "pve2", 200).await;

    let summary = gateway.cluster_summary().await.unwrap();

    assert_eq!(summary.cluster_name.as_deref(), Some("lab"));
    assert_eq!(summary.quorate, Some(true));
    assert!(!summary.is_partial());
    assert_eq!(summary.nodes.len(), 2);

    let pve1 = summary.node("pve1").unwrap();
    let ids: Vec<&str> = pve1.guests.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["qemu/100", "qemu/101", "lxc/150"]);
    assert_eq!(pve1.node.cpu, 0.5);
    assert!(pve1.warning.is_none());

    assert_eq!(summary.guest_counts.running, 4);
    assert_eq!(summary.guest_counts.stopped, 2);
    assert_eq!(summary.guest_counts.total(), 6);
    assert_eq!(summary.cpu.cores, 16);
    assert_eq!(summary.cpu.used_cores, 8.0);
    assert_eq!(summary.cpu.ratio, 0.5);
    assert_eq!(summary.memory.total, 2 * 17179869184);
    assert_eq!(summary.memory.ratio, 0.5);
    assert_eq!(summary.disk.ratio, 0.1);
}

#[tokio::test]
async fn test_cluster_summary_tolerates_failing_node() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes",
        json!([
            node_record("pve1", "online"),
            node_record("pve2", "online"),
            node_record("pve3", "online")
        ]),
    )
    .await;
    mount_quorate_cluster(&server).await;
    mount_healthy_node(&server, "pve1", 100).await;
    mount_healthy_node(&server, "pve3", 300).await;
    for tail in ["status", "qemu", "lxc"] {
        mount_status(
            &server,
            &format!("/api2/json/nodes/pve2/{}", tail),
            595,
            "no route to host",
        )
        .await;
    }

    let summary = gateway.cluster_summary().await.unwrap();

    assert_eq!(summary.nodes.len(), 3);
    assert_eq!(summary.failures.len(), 1);
    let failure = &summary.failures[0];
    assert_eq!(failure.target, "pve2");
    assert_eq!(failure.cause, ErrorKind::ConnectivityError);
    assert_eq!(failure.kind(), ErrorKind::PartialFailure);

    let pve2 = summary.node("pve2").unwrap();
    assert_eq!(pve2.warning.as_ref(), Some(failure));
    assert!(pve2.guests.is_empty());

    for healthy in ["pve1", "pve3"] {
        let slot = summary.node(healthy).unwrap();
        assert!(slot.warning.is_none());
        assert_eq!(slot.guests.len(), 3);
    }
    assert_eq!(summary.guest_counts.total(), 6);
}

#[tokio::test]
async fn test_cluster_summary_partial_guest_listing() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes",
        json!([node_record("pve1", "online")]),
    )
    .await;
    mount_quorate_cluster(&server).await;
    mount_data(
        &server,
        "/api2/json/nodes/pve1/status",
        json!({"cpu": 0.1, "memory": {"used": 1, "total": 2}}),
    )
    .await;
    mount_data(
        &server,
        "/api2/json/nodes/pve1/qemu",
        json!([guest_record(100, "web", "running")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/lxc"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "data": null,
            "message": "lxc listing unavailable"
        })))
        .mount(&server)
        .await;

    let summary = gateway.cluster_summary().await.unwrap();
    let slot = &summary.nodes[0];
    assert_eq!(slot.guests.len(), 1);
    let warning = slot.warning.as_ref().unwrap();
    assert_eq!(warning.cause, ErrorKind::ApiError);
    assert_eq!(warning.message, "lxc: lxc listing unavailable");
    assert_eq!(summary.failures.len(), 1);
}

#[tokio::test]
async fn test_cluster_summary_order_is_stable() {
    let (server, gateway) = create_test_gateway().await;
    // Deliberately not alphabetical.
    mount_data(
        &server,
        "/api2/json/nodes",
        json!([
            node_record("pve3", "online"),
            node_record("pve1", "online"),
            node_record("pve2", "online")
        ]),
    )
    .await;
    mount_quorate_cluster(&server).await;
    mount_healthy_node(&server, "pve1", 100).await;
    mount_healthy_node(&server, "pve2", 200).await;
    mount_healthy_node(&server, "pve3", 300).await;

    let order = |summary: &crate::ClusterSummary| -> Vec<String> {
        summary
            .nodes
            .iter()
            .flat_map(|slot| {
                std::iter::once(slot.node.id.clone())
                    .chain(slot.guests.iter().map(|g| g.id.clone()))
            })
            .collect()
    };

    let first = order(&gateway.cluster_summary().await.unwrap());
    let second = order(&gateway.cluster_summary().await.unwrap());
    assert_eq!(first, second);
    assert_eq!(first[0], "node/pve3");
    assert_eq!(first[4], "node/pve1");
}

#[tokio::test]
async fn test_cluster_summary_order_survives_slow_first_node() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes",
        json!([node_record("pve9", "online"), node_record("pve1", "online")]),
    )
    .await;
    mount_quorate_cluster(&server).await;
    mount_healthy_node(&server, "pve1", 100).await;

    let slow = |data: serde_json::Value| {
        ResponseTemplate::new(200)
            .set_body_json(json!({ "data": data }))
            .set_delay(Duration::from_millis(300))
    };
    for (suffix, data) in [
        ("status", json!({"cpu": 0.75, "cpuinfo": {"cpus": 4}})),
        (
            "qemu",
            json!([
                guest_record(900, "build", "running"),
                guest_record(901, "ci", "running")
            ]),
        ),
        ("lxc", json!([guest_record(950, "cache", "stopped")])),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/api2/json/nodes/pve9/{}", suffix)))
            .respond_with(slow(data))
            .mount(&server)
            .await;
    }

    let summary = gateway.cluster_summary().await.unwrap();
    assert!(!summary.is_partial());
    let names: Vec<&str> = summary.nodes.iter().map(|s| s.node.name.as_str()).collect();
    assert_eq!(names, vec!["pve9", "pve1"]);
    assert_eq!(summary.nodes[0].node.cpu, 0.75);
    let ids: Vec<&str> = summary.nodes[0].guests.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["qemu/900", "qemu/901", "lxc/950"]);
    let ids: Vec<&str> = summary.nodes[1].guests.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["qemu/100", "qemu/101", "lxc/150"]);
}

#[tokio::test]
async fn test_cluster_summary_skips_offline_node() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes",
        json!([node_record("pve1", "online"), {"node": "pve2", "status": "offline"}]),
    )
    .await;
    mount_quorate_cluster(&server).await;
    mount_healthy_node(&server, "pve1", 100).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve2/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let summary = gateway.cluster_summary().await.unwrap();
    assert_eq!(summary.nodes.len(), 2);
    assert_eq!(summary.nodes[1].node.status, ResourceStatus::Stopped);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].target, "pve2");
    assert_eq!(summary.failures[0].message, "node is stopped");
}

#[tokio::test]
async fn test_cluster_summary_unknown_quorum() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(&server, "/api2/json/nodes", json!([])).await;
    mount_status(&server, "/api2/json/cluster/status", 500, "").await;

    let summary = gateway.cluster_summary().await.unwrap();
    assert_eq!(summary.quorate, None);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].target, "cluster");
    assert_eq!(summary.cpu.ratio, 0.0);
}

#[tokio::test]
async fn test_cluster_summary_standalone_node_is_quorate() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(&server, "/api2/json/nodes", json!([])).await;
    mount_data(
        &server,
        "/api2/json/cluster/status",
        json!([{"type": "node", "name": "pve1", "online": 1, "local": 1}]),
    )
    .await;

    let summary = gateway.cluster_summary().await.unwrap();
    assert_eq!(summary.quorate, Some(true));
    assert_eq!(summary.cluster_name, None);
}

#[tokio::test]
async fn test_cluster_summary_needs_node_listing() {
    let (server, gateway) = create_test_gateway().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "data": null,
            "message": "Permission check failed (/, Sys.Audit)"
        })))
        .mount(&server)
        .await;

    let err = gateway.cluster_summary().await.unwrap_err();
    assert!(matches!(err, ProxmoxError::Authentication(ref m) if m == "Permission check failed (/, Sys.Audit)"));
}

#[tokio::test]
async fn test_version_and_nodes() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes",
        json!([node_record("pve1", "online"), {"status": "online"}]),
    )
    .await;

    let version = gateway.version().await.unwrap();
    assert_eq!(version.version, "8.3.0");
    assert_eq!(version.repoid.as_deref(), Some("c1689ccb"));

    let nodes = gateway.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].uptime_display(), "1d 1h 1m");
    assert_eq!(nodes[0].memory_ratio(), 0.25);
}

#[tokio::test]
async fn test_cluster_log() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/cluster/log",
        json!([
            {"time": 1714555392, "node": "pve1", "pri": 6, "tag": "pvedaemon", "user": "root@pam", "msg": "end task"},
            {"time": 1714555300, "node": "pve2", "pri": 3, "tag": "corosync", "msg": "link down"}
        ]),
    )
    .await;

    let events = gateway.cluster_log(Some(1)).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].node, "pve1");

    let err = gateway.cluster_log(Some(0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_users_and_roles() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/access/users",
        json!([
            {"userid": "root@pam", "enable": 1, "expire": 0},
            {"userid": "monitor@pve", "enable": 0, "expire": 1893456000u64, "email": "ops@example.com"}
        ]),
    )
    .await;
    mount_data(
        &server,
        "/api2/json/access/roles",
        json!([{"roleid": "PVEAuditor", "privs": "Sys.Audit,VM.Audit", "special": 1}]),
    )
    .await;

    let users = gateway.users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users[0].enabled);
    assert!(!users[1].enabled);
    assert!(users[1].expires_at.is_some());

    let roles = gateway.roles().await.unwrap();
    assert_eq!(roles[0].privileges, vec!["Sys.Audit", "VM.Audit"]);
}

#[tokio::test]
async fn test_cluster_firewall_options_failure_is_partial() {
    let (server, gateway) = create_test_gateway().await;
    mount_status(&server, "/api2/json/cluster/firewall/options", 500, "").await;
    mount_data(
        &server,
        "/api2/json/cluster/firewall/rules",
        json!([{"pos": 0, "type": "in", "action": "ACCEPT", "enable": 1, "macro": "SSH"}]),
    )
    .await;

    let state = gateway.cluster_firewall().await.unwrap();
    assert_eq!(state.enabled, None);
    assert_eq!(state.rules.len(), 1);
    assert_eq!(state.failures[0].target, "firewall-options");
}
