use crate::{
    ErrorKind, Operation, ProxmoxError, ProxmoxGateway, SessionCache,
    core::infrastructure::dispatcher::MockDispatch,
    tests::support::{create_test_endpoint, mount_status, node_record},
};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// A cluster whose `/version` check must be hit exactly `checks` times.
async fn versioned_server(checks: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/json/version"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"version": "8.3.0"}})),
        )
        .expect(checks)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_session_reused_across_operations() {
    let server = versioned_server(1).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [node_record("pve1", "online")]})),
        )
        .expect(3)
        .mount(&server)
        .await;
    let gateway = ProxmoxGateway::new(create_test_endpoint(&server)).unwrap();

    for _ in 0..3 {
        assert_eq!(gateway.list_nodes().await.unwrap().len(), 1);
    }
    assert_eq!(gateway.session_cache().constructed(), 1);
    assert_eq!(gateway.session_cache().len().await, 1);
}

#[tokio::test]
async fn test_rejected_token_rebuilds_session() {
    let server = versioned_server(2).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(ResponseTemplate::new(401).set_body_string("authentication failure"))
        .expect(2)
        .mount(&server)
        .await;
    let gateway = ProxmoxGateway::new(create_test_endpoint(&server)).unwrap();

    let first = gateway.list_nodes().await.unwrap_err();
    assert_eq!(first.kind(), ErrorKind::AuthError);
    assert_eq!(first.message(), "authentication failure");

    let second = gateway.list_nodes().await.unwrap_err();
    assert_eq!(second.kind(), ErrorKind::AuthError);
    assert_eq!(gateway.session_cache().constructed(), 2);
}

#[tokio::test]
async fn test_auth_error_from_any_dispatch_invalidates() {
    let server = versioned_server(2).await;
    let mut dispatch = MockDispatch::new();
    dispatch
        .expect_call()
        .times(2)
        .returning(|_, _| Err(ProxmoxError::Authentication("token expired".to_string())));
    let gateway = ProxmoxGateway::with_dispatcher(create_test_endpoint(&server), dispatch);

    assert!(gateway.users().await.is_err());
    assert!(gateway.users().await.is_err());
    assert_eq!(gateway.session_cache().constructed(), 2);
}

#[tokio::test]
async fn test_other_errors_keep_session() {
    let server = versioned_server(1).await;
    let mut dispatch = MockDispatch::new();
    dispatch
        .expect_call()
        .times(2)
        .returning(|_, _| Err(ProxmoxError::Connectivity("connection reset".to_string())));
    let gateway = ProxmoxGateway::with_dispatcher(create_test_endpoint(&server), dispatch);

    assert!(gateway.roles().await.is_err());
    assert!(gateway.roles().await.is_err());
    assert_eq!(gateway.session_cache().constructed(), 1);
}

#[tokio::test]
async fn test_gateway_dispatches_logical_operations() {
    let server = versioned_server(1).await;
    let mut dispatch = MockDispatch::new();
    dispatch
        .expect_call()
        .withf(|session, operation| {
            session.is_usable() && *operation == Operation::Nodes
        })
        .times(1)
        .returning(|_, _| Ok(json!([{"node": "pve1", "status": "online", "maxcpu": 4}])));
    let gateway = ProxmoxGateway::with_dispatcher(create_test_endpoint(&server), dispatch);

    let nodes = gateway.list_nodes().await.unwrap();
    assert_eq!(nodes[0].name, "pve1");
    assert_eq!(nodes[0].cpu_count, Some(4));
}

#[tokio::test]
async fn test_shared_cache_across_gateways() {
    let server = versioned_server(1).await;
    Mock::given(method("GET"))
        .and(path("/api2/json/nodes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [node_record("pve1", "online")]})),
        )
        .mount(&server)
        .await;
    let cache = Arc::new(SessionCache::new());
    let first = ProxmoxGateway::new(create_test_endpoint(&server))
        .unwrap()
        .with_session_cache(Arc::clone(&cache));
    let second = ProxmoxGateway::new(create_test_endpoint(&server))
        .unwrap()
        .with_session_cache(Arc::clone(&cache));

    let (a, b) = tokio::join!(first.list_nodes(), second.list_nodes());
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(cache.constructed(), 1);
}

#[tokio::test]
async fn test_rejected_version_check_leaves_no_session() {
    let server = MockServer::start().await;
    mount_status(&server, "/api2/json/version", 401, "").await;
    let gateway = ProxmoxGateway::new(create_test_endpoint(&server)).unwrap();

    let err = gateway.cluster_summary().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthError);
    assert!(gateway.session_cache().is_empty().await);
}
