//! Stream resolution integration tests.
//!
//! Covers the manager's provider selection and fallback, and a full
//! add, select, poll and unrestrict pass through real provider clients.

use std::sync::Arc;
use std::time::Duration;

use streamrelay_core::{
    config::DebridServiceType,
    debrid::{
        DebridError, DebridManager, HttpProviderFactory, PollPolicy, StreamResolver,
        WorkflowState,
    },
    http::{HttpResponse, Method},
    testing::{
        fixtures, MockConfigStore, MockDebridProvider, MockProviderFactory, MockSecretStore,
        MockTransport,
    },
};

const RD_TOKEN: &str = "rd-token-5a4b3c";
const AD_TOKEN: &str = "ad-token-9z8y7x";

fn fast_poll() -> PollPolicy {
    PollPolicy {
        attempts: 3,
        interval: Duration::from_millis(1),
    }
}

/// Real-Debrid then AllDebrid, both configured with tokens in the secret store.
async fn stores() -> (Arc<MockConfigStore>, Arc<MockSecretStore>) {
    let store = Arc::new(MockConfigStore::new());
    store
        .set_debrid(vec![
            fixtures::debrid_config(DebridServiceType::RealDebrid, "rd-ref", 0),
            fixtures::debrid_config(DebridServiceType::AllDebrid, "ad-ref", 1),
        ])
        .await;

    let secrets = Arc::new(MockSecretStore::new());
    secrets.insert("rd-ref", RD_TOKEN).await;
    secrets.insert("ad-ref", AD_TOKEN).await;
    (store, secrets)
}

fn real_debrid_routes(transport: &MockTransport) {
    transport.respond_with("/torrents?", HttpResponse::new(200, fixtures::rd_torrent_list()));
    transport.respond_with(
        "torrents/info/RDEXISTING",
        HttpResponse::new(200, fixtures::rd_torrent_info("downloaded")),
    );
    transport.respond_with("selectFiles/RDEXISTING", HttpResponse::new(204, ""));
    transport.respond_with(
        "unrestrict/link",
        HttpResponse::new(
            200,
            r#"{"download":"https://cdn.real-debrid.com/dl/abc/Dune.mkv?sig=1"}"#,
        ),
    );
}

fn all_debrid_routes(transport: &MockTransport) {
    transport.respond_with("magnet/status", HttpResponse::new(200, fixtures::ad_magnet_list()));
    transport.respond_with("id=555", HttpResponse::new(200, fixtures::ad_magnet_ready()));
    transport.respond_with(
        "link/unlock",
        HttpResponse::new(
            200,
            r#"{"status":"success","data":{"link":"https://cdn.alldebrid.com/dl/MAIN.mkv"}}"#,
        ),
    );
}

#[tokio::test]
async fn test_full_real_debrid_workflow() {
    let transport = Arc::new(MockTransport::new());
    real_debrid_routes(&transport);
    let (store, secrets) = stores().await;

    let manager = DebridManager::new(
        store,
        secrets,
        Arc::new(HttpProviderFactory::new(transport.clone(), Duration::from_secs(5))),
    )
    .with_poll_policy(fast_poll());

    let stream = manager.resolve_stream(fixtures::HASH_A, None).await.unwrap();

    assert_eq!(stream.debrid_service, DebridServiceType::RealDebrid);
    assert_eq!(stream.url, "https://cdn.real-debrid.com/dl/abc/Dune.mkv?sig=1");
    assert_eq!(stream.file_name, "Dune.Part.Two.2024.2160p.WEB-DL.DV.HDR10.H.265.mkv");

    let requests = transport.requests();
    let steps: Vec<(Method, String)> = requests
        .iter()
        .map(|r| (r.method, r.url.rsplit("/rest/1.0").next().unwrap_or("").to_string()))
        .collect();
    assert_eq!(
        steps,
        vec![
            (Method::Get, "/torrents".to_string()),
            (Method::Get, "/torrents/info/RDEXISTING".to_string()),
            (Method::Post, "/torrents/selectFiles/RDEXISTING".to_string()),
            (Method::Get, "/torrents/info/RDEXISTING".to_string()),
            (Method::Post, "/unrestrict/link".to_string()),
        ]
    );
    assert!(requests.iter().all(|r| !r.full_url().contains(RD_TOKEN)));
    assert!(!stream.url.contains(RD_TOKEN));
}

#[tokio::test]
async fn test_falls_back_from_unauthorized_real_debrid_to_all_debrid() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("api.real-debrid.com", HttpResponse::new(401, "bad token"));
    all_debrid_routes(&transport);
    let (store, secrets) = stores().await;

    let manager = DebridManager::new(
        store,
        secrets,
        Arc::new(HttpProviderFactory::new(transport.clone(), Duration::from_secs(5))),
    )
    .with_poll_policy(fast_poll());

    let stream = manager.resolve_stream(fixtures::HASH_A, None).await.unwrap();

    assert_eq!(stream.debrid_service, DebridServiceType::AllDebrid);
    assert_eq!(stream.url, "https://cdn.alldebrid.com/dl/MAIN.mkv");
    assert!(transport
        .requests()
        .iter()
        .all(|r| !r.full_url().contains(RD_TOKEN) && !r.full_url().contains(AD_TOKEN)));
}

#[tokio::test]
async fn test_preferred_service_is_pinned() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("api.real-debrid.com", HttpResponse::new(401, "bad token"));
    all_debrid_routes(&transport);
    let (store, secrets) = stores().await;

    let manager = DebridManager::new(
        store,
        secrets,
        Arc::new(HttpProviderFactory::new(transport.clone(), Duration::from_secs(5))),
    );

    let err = manager
        .resolve_stream(fixtures::HASH_A, Some(DebridServiceType::RealDebrid))
        .await
        .unwrap_err();

    assert_eq!(err, DebridError::Unauthorized);
    assert!(transport
        .requests()
        .iter()
        .all(|r| r.url.contains("real-debrid.com")));
}

#[tokio::test]
async fn test_resolver_call_order_for_fresh_hash() {
    let provider = MockDebridProvider::new(DebridServiceType::Premiumize);

    let stream = StreamResolver::new(&provider, fast_poll())
        .resolve(fixtures::HASH_C)
        .await
        .unwrap();

    assert_eq!(stream.debrid_service, DebridServiceType::Premiumize);
    assert_eq!(
        provider.calls().await,
        vec!["add_magnet", "select_files", "get_stream_url", "unrestrict"]
    );
}

#[tokio::test]
async fn test_exhausted_fallback_surfaces_last_error() {
    let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
    rd.fail_on("add_magnet", DebridError::RateLimited).await;
    let ad = MockDebridProvider::new(DebridServiceType::AllDebrid);
    ad.fail_on("get_stream_url", DebridError::Timeout).await;

    let factory = Arc::new(MockProviderFactory::new());
    factory.register(rd.clone());
    factory.register(ad.clone());
    let (store, secrets) = stores().await;

    let manager = DebridManager::new(store, secrets, factory.clone()).with_poll_policy(fast_poll());
    let err = manager.resolve_stream(fixtures::HASH_B, None).await.unwrap_err();

    assert_eq!(err, DebridError::Timeout);
    assert_eq!(rd.calls().await, vec!["add_magnet"]);
    assert_eq!(
        factory.created(),
        vec![
            (DebridServiceType::RealDebrid, RD_TOKEN.to_string()),
            (DebridServiceType::AllDebrid, AD_TOKEN.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_store_outage_is_not_configured() {
    let (store, secrets) = stores().await;
    store.set_unavailable(true).await;

    let manager = DebridManager::new(store, secrets, Arc::new(MockProviderFactory::new()));
    let err = manager.resolve_stream(fixtures::HASH_A, None).await.unwrap_err();

    assert!(matches!(err, DebridError::NotConfigured(_)));
}

#[tokio::test]
async fn test_out_of_order_step_is_invalid_state() {
    let provider = MockDebridProvider::new(DebridServiceType::Torbox);
    let mut resolver = StreamResolver::new(&provider, fast_poll());

    let err = resolver.unrestrict().await.unwrap_err();

    assert!(matches!(err, DebridError::InvalidState(_)));
    assert_eq!(resolver.state(), &WorkflowState::NotStarted);
    assert!(provider.calls().await.is_empty());
}

#[tokio::test]
async fn test_dropping_resolution_stops_polling() {
    let rd = MockDebridProvider::new(DebridServiceType::RealDebrid).with_not_ready_polls(10_000);
    let factory = Arc::new(MockProviderFactory::new());
    factory.register(rd.clone());
    let (store, secrets) = stores().await;
    let manager = DebridManager::new(store, secrets, factory).with_poll_policy(PollPolicy {
        attempts: 10_000,
        interval: Duration::from_millis(5),
    });

    let mut resolution = Box::pin(manager.resolve_stream(fixtures::HASH_A, None));
    tokio::select! {
        _ = &mut resolution => panic!("resolution finished while the file is never ready"),
        _ = tokio::time::sleep(Duration::from_millis(100)) => {}
    }
    drop(resolution);

    let polls = |calls: Vec<String>| calls.iter().filter(|c| *c == "get_stream_url").count();
    let polls_at_drop = polls(rd.calls().await);
    assert!(polls_at_drop > 0);

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(polls(rd.calls().await), polls_at_drop);
    assert!(!rd.calls().await.iter().any(|c| c == "unrestrict"));
}
