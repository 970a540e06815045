// Tests for crawl orchestration

use peerscope_core::crawl::{CrawlOptions, execute_crawl, format_progress};
use peerscope_scanner::{CancellationToken, CrawlConfig, CrawlProgress, ScanError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn fast_config() -> CrawlConfig {
    CrawlConfig::default()
        .with_request_delay(Duration::ZERO)
        .with_retry_backoff(Duration::from_millis(1))
        .with_request_timeout(Duration::from_secs(2))
        .with_progress_interval(Duration::from_millis(25))
        .with_concurrency(3)
}

async fn mount_node(server: &MockServer, peers: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "network": "arweave.N.1",
            "height": 1000,
            "peers": 2
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/peers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(peers))
        .mount(server)
        .await;
}

// ============================================================================
// Progress formatting
// ============================================================================

#[test]
fn test_format_progress() {
    let line = format_progress(&CrawlProgress {
        discovered: 12,
        responsive: 9,
        failed: 3,
        queued: 40,
        in_flight: 2,
        edges: 101,
    });
    assert_eq!(
        line,
        "Crawling... 12 nodes (9 up, 3 down), 40 queued, 2 in flight, 101 edges"
    );
}

// ============================================================================
// End-to-end over HTTP
// ============================================================================

/// seed {A}; A -> [B, C]; B -> [A, C]; C answers nothing but errors.
#[tokio::test]
async fn test_execute_crawl_three_node_scenario() {
    let node_a = MockServer::start().await;
    let node_b = MockServer::start().await;
    let node_c = MockServer::start().await;
    let (a, b, c) = (
        node_a.address().to_string(),
        node_b.address().to_string(),
        node_c.address().to_string(),
    );

    mount_node(&node_a, serde_json::json!([b, c])).await;
    mount_node(&node_b, serde_json::json!([format!("http://{}", a), c])).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&node_c)
        .await;

    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let outcome = execute_crawl(
        CrawlOptions {
            seeds: vec![a.clone()],
            config: fast_config(),
            show_progress_bars: false,
        },
        Some(Arc::new(move |line: String| sink.lock().unwrap().push(line))),
        None,
    )
    .await
    .unwrap();

    let graph = &outcome.graph;
    assert_eq!(outcome.snapshot.nodes.len(), 3);
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 4);
    assert!(graph.has_edge(&a, &b) && graph.has_edge(&b, &a));
    assert!(graph.has_edge(&a, &c) && graph.has_edge(&b, &c));
    assert_eq!(graph.degree(&a), 2);
    assert_eq!(graph.degree(&b), 2);
    assert_eq!(graph.degree(&c), 2);
    assert_eq!(graph.out_degree(&c), 0);
    assert!(!graph.node(&c).unwrap().responsive);
    assert_eq!(graph.bidirectional_edge_count(), 2);
    assert_eq!(graph.connected_components().len(), 1);

    let height = graph.node(&a).unwrap().info.as_ref().unwrap().height;
    assert_eq!(height, Some(1000));
    assert!(!messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_execute_crawl_respects_budget() {
    let node_a = MockServer::start().await;
    let node_b = MockServer::start().await;
    let (a, b) = (node_a.address().to_string(), node_b.address().to_string());
    mount_node(&node_a, serde_json::json!([b, "10.255.0.1:1984", "10.255.0.2:1984"])).await;
    mount_node(&node_b, serde_json::json!([a])).await;

    let outcome = execute_crawl(
        CrawlOptions {
            seeds: vec![a.clone()],
            config: fast_config().with_max_nodes(1),
            show_progress_bars: false,
        },
        None,
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome.snapshot.nodes.len(), 1);
    assert_eq!(outcome.snapshot.stats.responsive, 1);
    // Peers beyond the budget still show up as unreached graph nodes.
    assert_eq!(outcome.graph.node_count(), 4);
    assert_eq!(outcome.graph.out_degree(&a), 3);
}

#[tokio::test]
async fn test_execute_crawl_without_usable_seeds() {
    let result = execute_crawl(
        CrawlOptions {
            seeds: vec!["example.com".to_string()],
            config: fast_config(),
            show_progress_bars: false,
        },
        None,
        None,
    )
    .await;

    assert!(matches!(result, Err(ScanError::NoSeeds(1))));
}

#[tokio::test]
async fn test_execute_crawl_cancelled_up_front() {
    let node_a = MockServer::start().await;
    mount_node(&node_a, serde_json::json!([])).await;

    let token = CancellationToken::new();
    token.cancel();
    let outcome = execute_crawl(
        CrawlOptions {
            seeds: vec![node_a.address().to_string()],
            config: fast_config(),
            show_progress_bars: false,
        },
        None,
        Some(token),
    )
    .await
    .unwrap();

    assert!(outcome.snapshot.stats.cancelled);
    assert!(outcome.snapshot.nodes.is_empty());
    assert!(outcome.graph.is_empty());
}
