use crate::error::Result;
use crate::result::NodeInfo;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The two verbs the crawler consumes from the network being mapped.
///
/// Implementations report ordinary network and protocol failures as `None`
/// rather than erroring; the crawler owns the retry policy.
pub trait PeerSource: Send + Sync + 'static {
    fn fetch_node_info(&self, address: &str) -> impl Future<Output = Option<NodeInfo>> + Send;

    /// Raw peer strings exactly as the node reported them.
    fn fetch_peer_list(&self, address: &str) -> impl Future<Output = Option<Vec<String>>> + Send;
}

/// Peer source speaking plain HTTP: `GET /info` and `GET /peers`.
#[derive(Clone)]
pub struct HttpPeerSource {
    client: Client,
}

impl HttpPeerSource {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(5))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Peerscope/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }

    fn endpoint(address: &str, path: &str) -> Option<Url> {
        Url::parse(&format!("http://{}/{}", address, path)).ok()
    }

    async fn get_json<T: DeserializeOwned>(&self, address: &str, path: &str) -> Option<T> {
        let url = Self::endpoint(address, path)?;
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("GET /{} on {} failed: {}", path, address, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("GET /{} on {} returned {}", path, address, response.status());
            return None;
        }

        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!("Unparsable /{} payload from {}: {}", path, address, e);
                None
            }
        }
    }
}

impl PeerSource for HttpPeerSource {
    async fn fetch_node_info(&self, address: &str) -> Option<NodeInfo> {
        self.get_json(address, "info").await
    }

    async fn fetch_peer_list(&self, address: &str) -> Option<Vec<String>> {
        self.get_json(address, "peers").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn address_of(server: &MockServer) -> String {
        server.address().to_string()
    }

    #[tokio::test]
    async fn test_fetch_node_info() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "network": "arweave.N.1",
                "version": 5,
                "release": 69,
                "height": 1_234_567,
                "peers": 321
            })))
            .mount(&mock_server)
            .await;

        let source = HttpPeerSource::new().unwrap();
        let info = source
            .fetch_node_info(&address_of(&mock_server))
            .await
            .expect("info should parse");

        assert_eq!(info.version, Some(5));
        assert_eq!(info.height, Some(1_234_567));
        assert_eq!(info.reported_peer_count, Some(321));
    }

    #[tokio::test]
    async fn test_fetch_peer_list() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/peers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!(["1.2.3.4:1984", "http://5.6.7.8"])),
            )
            .mount(&mock_server)
            .await;

        let source = HttpPeerSource::new().unwrap();
        let peers = source
            .fetch_peer_list(&address_of(&mock_server))
            .await
            .expect("peers should parse");

        assert_eq!(peers, vec!["1.2.3.4:1984", "http://5.6.7.8"]);
    }

    #[tokio::test]
    async fn test_error_status_is_no_data() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let source = HttpPeerSource::new().unwrap();
        assert!(source.fetch_node_info(&address_of(&mock_server)).await.is_none());
        assert!(source.fetch_peer_list(&address_of(&mock_server)).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_no_data() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/peers"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&mock_server)
            .await;

        let source = HttpPeerSource::new().unwrap();
        assert!(source.fetch_peer_list(&address_of(&mock_server)).await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_no_data() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let source = HttpPeerSource::with_timeout(Duration::from_millis(100)).unwrap();
        assert!(source.fetch_node_info(&address_of(&mock_server)).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_no_data() {
        let source = HttpPeerSource::with_timeout(Duration::from_millis(200)).unwrap();
        // Port 9 (discard) on loopback is closed on test machines.
        assert!(source.fetch_peer_list("127.0.0.1:9").await.is_none());
    }
}
