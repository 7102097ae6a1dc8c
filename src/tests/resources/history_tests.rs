use crate::{
    ErrorKind, GuestKind, ProxmoxGateway, StatsTarget, Timeframe,
    core::infrastructure::dispatcher::MockDispatch,
    tests::support::{create_test_endpoint, create_test_gateway},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn node_target(node: &str) -> StatsTarget {
    StatsTarget::Node {
        node: node.to_string(),
    }
}

#[tokio::test]
async fn test_unknown_timeframe_makes_no_call() {
    let server = MockServer::start().await;
    let mut dispatch = MockDispatch::new();
    dispatch.expect_call().never();
    let gateway = ProxmoxGateway::with_dispatcher(create_test_endpoint(&server), dispatch);

    let err = gateway
        .historical_stats(node_target("pve1"), "fortnight")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(err.message().contains("fortnight"));
    assert_eq!(gateway.session_cache().constructed(), 0);
}

#[tokio::test]
async fn test_empty_node_is_rejected() {
    let server = MockServer::start().await;
    let mut dispatch = MockDispatch::new();
    dispatch.expect_call().never();
    let gateway = ProxmoxGateway::with_dispatcher(create_test_endpoint(&server), dispatch);

    let err = gateway
        .historical_stats(node_target(""), "hour")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_node_history_buckets_and_skips() {
    let (server, gateway) = create_test_gateway().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/rrddata"))
        .and(query_param("timeframe", "day"))
        .and(query_param("cf", "AVERAGE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"time": 1800, "cpu": 0.2, "memused": 100, "memtotal": 1000,
             "rootused": 10, "roottotal": 100, "netin": 10.0, "netout": 20.0},
            {"time": 2400, "cpu": 0.4, "memused": 300, "memtotal": 1000,
             "rootused": 30, "roottotal": 100},
            {"time": 3600, "cpu": 0.1, "memused": 100, "memtotal": 1000,
             "rootused": 10, "roottotal": 100},
            {"time": 5400},
            {"time": 7200, "cpu": "n/a"}
        ]})))
        .mount(&server)
        .await;

    let series = gateway
        .historical_stats(node_target("pve1"), "Day")
        .await
        .unwrap();
    assert_eq!(series.timeframe, Timeframe::Day);
    assert_eq!(series.skipped, 2);
    let times: Vec<u64> = series.points.iter().map(|p| p.timestamp).collect();
    assert_eq!(times, vec![1800, 3600]);

    let first = &series.points[0];
    assert!((first.cpu - 0.3).abs() < 1e-9);
    assert_eq!(first.memory_used, 200);
    assert_eq!(first.disk_used, 20);
    assert_eq!(first.net_in, Some(10.0));
    assert_eq!(series.points[1].net_out, None);
}

#[tokio::test]
async fn test_guest_history() {
    let (server, gateway) = create_test_gateway().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes/pve1/lxc/150/rrddata"))
        .and(query_param("timeframe", "hour"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"time": 60, "cpu": 0.5, "mem": 512, "maxmem": 1024, "disk": 1, "maxdisk": 4},
            {"time": 120, "cpu": 0.25, "mem": 256, "maxmem": 1024, "disk": 1, "maxdisk": 4}
        ]})))
        .mount(&server)
        .await;

    let target = StatsTarget::Guest {
        node: "pve1".to_string(),
        kind: GuestKind::Lxc,
        vmid: 150,
    };
    let series = gateway
        .historical_stats(target.clone(), "hour")
        .await
        .unwrap();
    assert_eq!(series.target, target);
    assert_eq!(series.skipped, 0);
    assert_eq!(series.points.len(), 2);
    assert_eq!(series.points[0].memory_total, 1024);
    assert_eq!(series.points[1].cpu, 0.25);
}
