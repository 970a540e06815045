use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Metadata a node reports about itself through the "get metadata" verb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeInfo {
    pub network: Option<String>,
    pub version: Option<u64>,
    pub release: Option<u64>,
    pub height: Option<u64>,
    /// Number of peers the node claims to know.
    #[serde(rename = "peers")]
    pub reported_peer_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredNode {
    pub address: String,
    pub responsive: bool,
    pub info: Option<NodeInfo>,
    pub discovered_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub attempts: u32,
}

impl DiscoveredNode {
    /// A node that has been dequeued but not (yet) answered.
    pub fn new(address: String) -> Self {
        Self {
            address,
            responsive: false,
            info: None,
            discovered_at: Utc::now(),
            last_seen: None,
            attempts: 0,
        }
    }

    /// A node named by some peer list that the crawl never reached.
    pub fn placeholder(address: String, discovered_at: DateTime<Utc>) -> Self {
        Self {
            address,
            responsive: false,
            info: None,
            discovered_at,
            last_seen: None,
            attempts: 0,
        }
    }

    pub fn mark_responsive(&mut self, info: NodeInfo, attempts: u32) {
        self.responsive = true;
        self.info = Some(info);
        self.last_seen = Some(Utc::now());
        self.attempts = attempts;
    }

    pub fn mark_failed(&mut self, info: Option<NodeInfo>, attempts: u32) {
        self.responsive = false;
        if info.is_some() {
            self.last_seen = Some(Utc::now());
        }
        self.info = info;
        self.attempts = attempts;
    }
}

/// Directed observation: `source`'s peer list names `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEdge {
    pub source: String,
    pub target: String,
    pub discovered_at: DateTime<Utc>,
    pub bidirectional: bool,
}

impl PeerEdge {
    pub fn new(source: String, target: String) -> Self {
        Self {
            source,
            target,
            discovered_at: Utc::now(),
            bidirectional: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlStats {
    pub discovered: usize,
    pub responsive: usize,
    pub failed: usize,
    pub edges: usize,
    pub elapsed: Duration,
    pub cancelled: bool,
}

/// Point-in-time view of a running crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlProgress {
    pub discovered: usize,
    pub responsive: usize,
    pub failed: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub edges: usize,
}

/// Everything one crawl produced, handed to the graph engine as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSnapshot {
    pub nodes: HashMap<String, DiscoveredNode>,
    pub edges: Vec<PeerEdge>,
    pub stats: CrawlStats,
}

impl CrawlSnapshot {
    /// Edges ordered by discovery time (ties broken by endpoints).
    pub fn edges_by_time(&self) -> Vec<&PeerEdge> {
        let mut edges: Vec<&PeerEdge> = self.edges.iter().collect();
        edges.sort_by(|a, b| {
            a.discovered_at
                .cmp(&b.discovered_at)
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.target.cmp(&b.target))
        });
        edges
    }
}
