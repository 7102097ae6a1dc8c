use crate::{
    ErrorKind, ProxmoxError, ProxmoxGateway, StorageFilter, StorageType, TaskFilter, TaskStatus,
    core::infrastructure::dispatcher::MockDispatch,
    tests::support::{
        create_test_endpoint, create_test_gateway, mount_data, mount_status, node_record,
    },
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

async fn mount_two_nodes(server: &MockServer) {
    mount_data(
        server,
        "/api2/json/nodes",
        json!([node_record("pve1", "online"), node_record("pve2", "online")]),
    )
    .await;
}

fn nas(node_used: u64) -> serde_json::Value {
    json!({
        "storage": "nas", "type": "nfs", "content": "backup,iso",
        "total": 1000, "used": node_used, "avail": 1000 - node_used,
        "active": 1, "enabled": 1, "shared": 1
    })
}

fn local(used: u64) -> serde_json::Value {
    json!({
        "storage": "local", "type": "dir", "content": "images,rootdir",
        "total": 500, "used": used, "avail": 500 - used,
        "active": 1, "enabled": 1, "shared": 0
    })
}

#[tokio::test]
async fn test_node_status() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes/pve1/status",
        json!({
            "cpu": 0.125,
            "wait": 0.02,
            "uptime": 3600,
            "loadavg": ["0.50", "0.40", "0.30"],
            "kversion": "Linux 6.8.12-4-pve",
            "pveversion": "pve-manager/8.3.0",
            "cpuinfo": {"cpus": 16, "model": "AMD EPYC"},
            "memory": {"used": 2048, "total": 8192},
            "swap": {"used": 0, "total": 1024},
            "rootfs": {"used": 100, "total": 400}
        }),
    )
    .await;

    let detail = gateway.node_status("pve1").await.unwrap();
    assert_eq!(detail.resource.id, "node/pve1");
    assert_eq!(detail.resource.cpu_count, Some(16));
    assert_eq!(detail.resource.memory_ratio(), 0.25);
    assert_eq!(detail.resource.disk_ratio(), 0.25);
    assert_eq!(detail.load_average, Some([0.5, 0.4, 0.3]));
    assert_eq!(detail.cpu_model.as_deref(), Some("AMD EPYC"));
    assert_eq!(detail.swap_total, 1024);
}

#[tokio::test]
async fn test_node_status_rejects_empty_node() {
    let (_server, gateway) = create_test_gateway().await;
    let err = gateway.node_status("  ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert_eq!(gateway.session_cache().constructed(), 0);
}

#[tokio::test]
async fn test_node_status_unknown_node() {
    let (server, gateway) = create_test_gateway().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve9/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "data": null,
            "message": "hostname lookup 'pve9' failed - failed to get address info for: pve9\n"
        })))
        .mount(&server)
        .await;

    match gateway.node_status("pve9").await.unwrap_err() {
        ProxmoxError::Api { status, message } => {
            assert_eq!(status, 500);
            assert!(message.starts_with("hostname lookup 'pve9' failed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_network_interfaces() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes/pve1/network",
        json!([
            {"iface": "vmbr0", "type": "bridge", "active": 1, "autostart": 1,
             "cidr": "10.0.0.2/24", "gateway": "10.0.0.1", "bridge_ports": "eno1"},
            {"iface": "eno1", "type": "eth", "active": 1, "autostart": 0},
            {"type": "eth"}
        ]),
    )
    .await;

    let interfaces = gateway.network_interfaces("pve1").await.unwrap();
    assert_eq!(interfaces.len(), 2);
    assert_eq!(interfaces[0].name, "vmbr0");
    assert_eq!(interfaces[0].cidr.as_deref(), Some("10.0.0.2/24"));
    assert_eq!(interfaces[0].ports, vec!["eno1"]);
    assert!(!interfaces[1].autostart);
}

#[tokio::test]
async fn test_storage_summary_merges_pools() {
    let (server, gateway) = create_test_gateway().await;
    mount_two_nodes(&server).await;
    mount_data(&server, "/api2/json/nodes/pve1/storage", json!([local(100), nas(400)])).await;
    mount_data(&server, "/api2/json/nodes/pve2/storage", json!([local(200), nas(400)])).await;
    mount_data(
        &server,
        "/api2/json/storage",
        json!([
            {"storage": "local", "type": "dir", "path": "/var/lib/vz"},
            {"storage": "nas", "type": "nfs", "server": "10.0.0.9", "export": "/srv/pve"}
        ]),
    )
    .await;

    let listing = gateway.storage_summary(&StorageFilter::default()).await.unwrap();
    assert!(listing.failures.is_empty());
    let ids: Vec<&str> = listing.pools.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["local", "nas"]);

    let local = &listing.pools[0];
    assert_eq!(local.total, 1000);
    assert_eq!(local.used, 300);
    assert!(local.remote.is_none());

    let nas = &listing.pools[1];
    assert_eq!(nas.total, 1000);
    assert_eq!(nas.used, 400);
    assert_eq!(nas.nodes.len(), 2);
    let remote = nas.remote.as_ref().unwrap();
    assert_eq!(remote.server, "10.0.0.9");
    assert_eq!(remote.export.as_deref(), Some("/srv/pve"));
    // Backup counts are only filled in for a single node.
    assert_eq!(nas.backup_count, None);

    let network = gateway
        .storage_summary(&StorageFilter::default().network_only(true))
        .await
        .unwrap();
    assert_eq!(network.pools.len(), 1);
    assert_eq!(network.pools[0].storage_type, StorageType::Nfs);
}

#[tokio::test]
async fn test_storage_summary_partial_failures() {
    let (server, gateway) = create_test_gateway().await;
    mount_two_nodes(&server).await;
    mount_data(&server, "/api2/json/nodes/pve1/storage", json!([local(100)])).await;
    mount_status(&server, "/api2/json/nodes/pve2/storage", 596, "").await;
    mount_status(&server, "/api2/json/storage", 500, "").await;

    let listing = gateway.storage_summary(&StorageFilter::default()).await.unwrap();
    assert_eq!(listing.pools.len(), 1);
    let targets: Vec<&str> = listing.failures.iter().map(|f| f.target.as_str()).collect();
    assert_eq!(targets, vec!["pve2", "storage-config"]);
    assert_eq!(listing.failures[0].cause, ErrorKind::ConnectivityError);
}

#[tokio::test]
async fn test_storage_summary_single_node_counts_backups() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(&server, "/api2/json/nodes/pve1/storage", json!([local(100), nas(400)])).await;
    mount_data(&server, "/api2/json/storage", json!([])).await;
    mount_data(
        &server,
        "/api2/json/nodes/pve1/storage/nas/content",
        json!([
            {"volid": "nas:backup/vzdump-qemu-100-2024_05_01-00_00_00.vma.zst", "content": "backup", "size": 1024, "ctime": 1714521600},
            {"volid": "nas:backup/vzdump-lxc-150-2024_05_01-01_00_00.tar.zst", "content": "backup", "size": 2048, "ctime": 1714525200}
        ]),
    )
    .await;
    // The node listing is not needed when the node is named.
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let listing = gateway
        .storage_summary(&StorageFilter::default().node("pve1"))
        .await
        .unwrap();
    assert_eq!(listing.pools[0].backup_count, None);
    assert_eq!(listing.pools[1].backup_count, Some(2));
}

#[tokio::test]
async fn test_backup_inventory() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(&server, "/api2/json/nodes/pve1/storage", json!([local(100), nas(400)])).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/storage/nas/content"))
        .and(query_param("content", "backup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"volid": "nas:backup/vzdump-qemu-100-2024_05_01-00_00_00.vma.zst", "size": 1024,
             "ctime": 1714521600, "format": "vma.zst", "protected": 1, "notes": "before upgrade"},
            {"volid": "nas:iso/debian.iso", "content": "iso"}
        ]})))
        .mount(&server)
        .await;

    let listing = gateway.backup_inventory("pve1", None).await.unwrap();
    assert!(listing.failures.is_empty());
    assert_eq!(listing.backups.len(), 1);
    let backup = &listing.backups[0];
    assert_eq!(backup.vmid, Some(100));
    assert_eq!(backup.storage, "nas");
    assert!(backup.protected);
    assert_eq!(backup.notes.as_deref(), Some("before upgrade"));

    let direct = gateway.backup_inventory("pve1", Some("nas")).await.unwrap();
    assert_eq!(direct.backups, listing.backups);

    let err = gateway.backup_inventory("pve1", Some("")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

fn task(upid_type: &str, vmid: u32, status: Option<&str>, start: u64) -> serde_json::Value {
    let upid = format!(
        "UPID:pve1:0000A1B2:00C3D4E5:{:08X}:{}:{}:root@pam:",
        start, upid_type, vmid
    );
    let mut record = json!({
        "upid": upid, "type": upid_type, "id": vmid.to_string(),
        "user": "root@pam", "starttime": start
    });
    if let Some(status) = status {
        record["status"] = json!(status);
        record["endtime"] = json!(start + 60);
    }
    record
}

#[tokio::test]
async fn test_recent_tasks_filters_before_limit() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/nodes/pve1/tasks",
        json!([
            task("qmstart", 100, None, 1714555500),
            task("vzdump", 100, Some("OK"), 1714555400),
            task("vzdump", 101, Some("job errors"), 1714555300),
            task("qmstop", 100, Some("WARNINGS: 1"), 1714555200),
            task("vzdump", 102, Some("unable to acquire lock"), 1714555100)
        ]),
    )
    .await;

    let errors = gateway
        .recent_tasks(
            &TaskFilter::default()
                .node("pve1")
                .status(TaskStatus::Error)
                .limit(5),
        )
        .await
        .unwrap();
    assert_eq!(errors.tasks.len(), 2);
    assert!(errors.tasks.iter().all(|t| t.status == TaskStatus::Error));

    let limited = gateway
        .recent_tasks(&TaskFilter::default().node("pve1").limit(2))
        .await
        .unwrap();
    assert_eq!(limited.tasks.len(), 2);
    assert_eq!(limited.tasks[0].status, TaskStatus::Running);
    assert_eq!(limited.tasks[0].node, "pve1");
    assert_eq!(limited.tasks[0].guest_id, Some(100));
}

#[tokio::test]
async fn test_recent_tasks_passes_limit_without_status_filter() {
    let (server, gateway) = create_test_gateway().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/tasks"))
        .and(query_param("limit", "3"))
        .and(query_param("vmid", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            task("qmstart", 100, Some("OK"), 1714555500)
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let listing = gateway
        .recent_tasks(&TaskFilter::default().node("pve1").vmid(100).limit(3))
        .await
        .unwrap();
    assert_eq!(listing.tasks.len(), 1);
}

#[tokio::test]
async fn test_recent_tasks_cluster_wide() {
    let (server, gateway) = create_test_gateway().await;
    mount_data(
        &server,
        "/api2/json/cluster/tasks",
        json!([
            task("vzdump", 100, Some("OK"), 1714555400),
            {"upid": "UPID:pve2:00001111:00002222:66320B00:qmigrate:101:root@pam:", "status": "OK", "endtime": 1714555999}
        ]),
    )
    .await;

    let listing = gateway.recent_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(listing.tasks.len(), 2);
    assert_eq!(listing.tasks[1].node, "pve2");
    assert_eq!(listing.tasks[1].task_type, "qmigrate");

    let err = gateway
        .recent_tasks(&TaskFilter::default().limit(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_node_id_cannot_leave_its_path_segment() {
    let server = MockServer::start().await;
    let mut dispatch = MockDispatch::new();
    dispatch.expect_call().never();
    let gateway = ProxmoxGateway::with_dispatcher(create_test_endpoint(&server), dispatch);

    for node in ["..", ".", "pve1/qemu"] {
        let err = gateway.node_status(node).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }
    let err = gateway.backup_inventory("pve1", Some("..")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert_eq!(gateway.session_cache().constructed(), 0);
}
