//! Indexer fan-out integration tests.
//!
//! These drive the aggregator end to end: configs from a store, backends
//! from a factory, and either mock indexers or real protocol clients over a
//! mock transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use streamrelay_core::{
    classifier::Quality,
    config::IndexerType,
    http::HttpResponse,
    searcher::{HttpIndexerFactory, IndexerAggregator, IndexerBackend, MediaType, SearchError},
    store::StaticConfigStore,
    testing::{
        fixtures, MockConfigStore, MockIndexer, MockIndexerFactory, MockSecretStore,
        MockTransport,
    },
};

/// Aggregator over mock indexers, each configured under its own name.
async fn aggregator_with(indexers: Vec<MockIndexer>) -> IndexerAggregator {
    let store = MockConfigStore::new();
    let factory = MockIndexerFactory::new();

    let configs = indexers
        .iter()
        .map(|i| fixtures::indexer_config(i.name(), IndexerType::Yts))
        .collect();
    store.set_indexers(configs).await;
    for indexer in indexers {
        factory.register(indexer);
    }

    IndexerAggregator::new(
        Arc::new(store),
        Arc::new(MockSecretStore::new()),
        Arc::new(factory),
    )
}

#[tokio::test]
async fn test_all_indexers_failing_raises_all_indexers_failed() {
    let aggregator = aggregator_with(vec![
        MockIndexer::new("one").failing_with(SearchError::ApiError("HTTP 500".into())),
        MockIndexer::new("two").failing_with(SearchError::ConnectionFailed("refused".into())),
    ])
    .await;

    let err = aggregator
        .search_by_query("dune", MediaType::Movie)
        .await
        .unwrap_err();

    match err {
        SearchError::AllIndexersFailed { detail, errors } => {
            assert_eq!(errors.len(), 2);
            assert!(detail.starts_with("2 indexer(s) failed"));
        }
        other => panic!("expected AllIndexersFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_one_success_among_failures_returns_its_results() {
    let good = MockIndexer::new("good").with_results(vec![
        fixtures::raw_result("Dune.2021.2160p.BluRay.x265", fixtures::HASH_A),
        fixtures::raw_result("Dune.2021.1080p.WEB-DL.x264", fixtures::HASH_B),
    ]);
    let aggregator = aggregator_with(vec![
        MockIndexer::new("bad").failing_with(SearchError::Timeout),
        good.clone(),
        MockIndexer::new("worse").failing_with(SearchError::Parse("garbage".into())),
    ])
    .await;

    let results = aggregator
        .search_by_query("dune", MediaType::Movie)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.indexer_name == "good"));
    assert_eq!(results[0].quality, Quality::Uhd4k);
    assert_eq!(good.searches().await, vec!["dune"]);
}

#[tokio::test]
async fn test_same_hash_from_two_indexers_is_kept_twice() {
    let aggregator = aggregator_with(vec![
        MockIndexer::new("left")
            .with_results(vec![fixtures::raw_result("Dune.2021.1080p", fixtures::HASH_A)]),
        MockIndexer::new("right")
            .with_results(vec![fixtures::raw_result("Dune 2021 1080p", fixtures::HASH_A)]),
    ])
    .await;

    let results = aggregator
        .search_by_query("dune", MediaType::Movie)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_ne!(results[0], results[1]);
    assert_ne!(results[0].id(), results[1].id());
}

#[tokio::test]
async fn test_hung_indexer_is_bounded_by_its_timeout() {
    let aggregator = aggregator_with(vec![
        MockIndexer::new("hung").with_delay(Duration::from_secs(30)),
        MockIndexer::new("fast")
            .with_results(vec![fixtures::raw_result("Dune.2021.720p", fixtures::HASH_C)]),
    ])
    .await
    .with_timeout(Duration::from_millis(100));

    let start = Instant::now();
    let results = aggregator
        .search_by_query("dune", MediaType::Movie)
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].indexer_name, "fast");
}

#[tokio::test]
async fn test_every_indexer_timing_out_fails() {
    let aggregator = aggregator_with(vec![
        MockIndexer::new("hung").with_delay(Duration::from_secs(30)),
    ])
    .await
    .with_timeout(Duration::from_millis(50));

    let err = aggregator
        .search_by_query("dune", MediaType::Movie)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::AllIndexersFailed { .. }));
}

#[tokio::test]
async fn test_real_protocol_clients_over_one_transport() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_with("jackett.local", HttpResponse::new(200, fixtures::TORZNAB_FEED));
    transport.respond_with("list_movies.json", HttpResponse::new(200, fixtures::YTS_RESPONSE));
    transport.respond_with("q.php", HttpResponse::new(503, "maintenance"));

    let mut torznab = fixtures::indexer_config("jackett", IndexerType::Torznab);
    torznab.base_url = Some("http://jackett.local/api".to_string());
    torznab.api_key_ref = Some("jackett-key".to_string());
    torznab.priority = 1;

    let store = StaticConfigStore::new(
        vec![
            torznab,
            fixtures::indexer_config("yts", IndexerType::Yts),
            fixtures::indexer_config("tpb", IndexerType::Apibay),
        ],
        Vec::new(),
    );
    let secrets = MockSecretStore::new();
    secrets.insert("jackett-key", "jk-123").await;

    let aggregator = IndexerAggregator::new(
        Arc::new(store),
        Arc::new(secrets),
        Arc::new(HttpIndexerFactory::new(transport.clone(), Duration::from_secs(5))),
    );

    let results = aggregator
        .search_by_query("Dune", MediaType::Movie)
        .await
        .unwrap();

    // Torznab and YTS each return two; apibay fails quietly
    assert_eq!(results.len(), 4);
    assert_eq!(transport.call_count(), 3);
    assert!(results.iter().all(|r| r.info_hash.len() == 40));

    let torznab_request = transport
        .requests()
        .into_iter()
        .find(|r| r.url.contains("jackett.local"))
        .unwrap();
    assert!(torznab_request.full_url().contains("apikey=jk-123"));
}

#[tokio::test]
async fn test_dropping_search_cancels_in_flight_indexers() {
    let hung = MockIndexer::new("hung").with_delay(Duration::from_secs(30));
    let aggregator = aggregator_with(vec![hung.clone()]).await;

    let mut search = Box::pin(aggregator.search_by_query("dune", MediaType::Movie));
    tokio::select! {
        _ = &mut search => panic!("search finished while its only indexer hangs"),
        _ = tokio::time::sleep(Duration::from_millis(100)) => {}
    }
    assert_eq!(hung.in_flight(), 1);

    drop(search);

    assert_eq!(hung.in_flight(), 0);
    assert_eq!(hung.searches().await, vec!["dune"]);
}

#[tokio::test]
async fn test_outer_timeout_cancels_in_flight_indexers() {
    let hung = MockIndexer::new("hung").with_delay(Duration::from_secs(30));
    let slow = MockIndexer::new("slow").with_delay(Duration::from_secs(30));
    let aggregator = aggregator_with(vec![hung.clone(), slow.clone()]).await;

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        aggregator.search_by_query("dune", MediaType::Movie),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(hung.in_flight(), 0);
    assert_eq!(slow.in_flight(), 0);
}
