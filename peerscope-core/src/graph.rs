// Peer graph model built from a finished crawl

use chrono::{DateTime, Utc};
use peerscope_scanner::{CrawlSnapshot, DiscoveredNode, PeerEdge};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

/// Directed peer graph over one crawl snapshot.
///
/// Node ids are assigned in ascending address order and adjacency lists are
/// kept sorted, so every metric computed from the graph is independent of the
/// order in which the crawl discovered things. The graph is immutable once
/// built.
#[derive(Debug, Clone)]
pub struct PeerGraph {
    graph: DiGraph<DiscoveredNode, PeerEdge>,
    index: HashMap<String, NodeIndex>,
    /// Sorted, deduplicated neighbours ignoring direction, by node id.
    undirected: Vec<Vec<usize>>,
    self_loops_dropped: usize,
}

impl PeerGraph {
    pub fn from_snapshot(snapshot: &CrawlSnapshot) -> Self {
        Self::build(snapshot.nodes.values().cloned(), &snapshot.edges)
    }

    /// Build the graph from a node registry and a directed edge list.
    ///
    /// Duplicate edges collapse into one, self-loops are dropped, and edge
    /// endpoints missing from `nodes` are added as unresponsive placeholders.
    pub fn build(nodes: impl IntoIterator<Item = DiscoveredNode>, edges: &[PeerEdge]) -> Self {
        let mut registry: HashMap<String, DiscoveredNode> = nodes
            .into_iter()
            .map(|node| (node.address.clone(), node))
            .collect();

        // Placeholders take the earliest time any edge named them.
        let mut self_loops_dropped = 0;
        let mut placeholders: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for edge in edges {
            if edge.source == edge.target {
                self_loops_dropped += 1;
                continue;
            }
            for endpoint in [&edge.source, &edge.target] {
                if registry.contains_key(endpoint) {
                    continue;
                }
                placeholders
                    .entry(endpoint.as_str())
                    .and_modify(|at| *at = (*at).min(edge.discovered_at))
                    .or_insert(edge.discovered_at);
            }
        }
        for (address, discovered_at) in placeholders {
            registry.insert(
                address.to_string(),
                DiscoveredNode::placeholder(address.to_string(), discovered_at),
            );
        }

        let mut ordered: Vec<DiscoveredNode> = registry.into_values().collect();
        ordered.sort_by(|a, b| a.address.cmp(&b.address));

        let mut graph = DiGraph::with_capacity(ordered.len(), edges.len());
        let mut index = HashMap::with_capacity(ordered.len());
        for node in ordered {
            let address = node.address.clone();
            let ix = graph.add_node(node);
            index.insert(address, ix);
        }

        // Keyed by (source id, target id); keeps the earliest observation.
        let mut observed: HashMap<(usize, usize), &PeerEdge> = HashMap::with_capacity(edges.len());
        for edge in edges.iter().filter(|e| e.source != e.target) {
            let key = (index[&edge.source].index(), index[&edge.target].index());
            observed
                .entry(key)
                .and_modify(|seen| {
                    if edge.discovered_at < seen.discovered_at {
                        *seen = edge;
                    }
                })
                .or_insert(edge);
        }

        let mut keys: Vec<(usize, usize)> = observed.keys().copied().collect();
        keys.sort_unstable();

        let mut undirected = vec![Vec::new(); graph.node_count()];
        for (source, target) in keys {
            let mut edge = observed[&(source, target)].clone();
            edge.bidirectional = observed.contains_key(&(target, source));
            graph.add_edge(NodeIndex::new(source), NodeIndex::new(target), edge);
            undirected[source].push(target);
            undirected[target].push(source);
        }
        for neighbours in &mut undirected {
            neighbours.sort_unstable();
            neighbours.dedup();
        }

        if self_loops_dropped > 0 {
            debug!("Dropped {} self-referencing edge(s)", self_loops_dropped);
        }

        Self {
            graph,
            index,
            undirected,
            self_loops_dropped,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn self_loops_dropped(&self) -> usize {
        self.self_loops_dropped
    }

    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    pub fn node(&self, address: &str) -> Option<&DiscoveredNode> {
        self.index.get(address).map(|&ix| &self.graph[ix])
    }

    /// Nodes in ascending address order.
    pub fn nodes(&self) -> impl Iterator<Item = &DiscoveredNode> {
        self.graph.node_weights()
    }

    /// Edges in ascending (source, target) order, with bidirectional flags set.
    pub fn edges(&self) -> impl Iterator<Item = &PeerEdge> {
        self.graph.edge_weights()
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&s), Some(&t)) => self.graph.contains_edge(s, t),
            _ => false,
        }
    }

    pub fn out_degree(&self, address: &str) -> usize {
        self.index
            .get(address)
            .map(|&ix| self.graph.neighbors_directed(ix, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    pub fn in_degree(&self, address: &str) -> usize {
        self.index
            .get(address)
            .map(|&ix| self.graph.neighbors_directed(ix, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Number of distinct peers connected in either direction.
    pub fn degree(&self, address: &str) -> usize {
        self.id(address)
            .map(|id| self.undirected[id].len())
            .unwrap_or(0)
    }

    /// Peers connected in either direction, in ascending address order.
    pub fn neighbors(&self, address: &str) -> Vec<&str> {
        self.id(address)
            .map(|id| {
                self.undirected[id]
                    .iter()
                    .map(|&n| self.address_of(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Addresses `address` lists as peers, ascending.
    pub fn out_neighbors(&self, address: &str) -> Vec<&str> {
        self.directed_neighbors(address, Direction::Outgoing)
    }

    /// Addresses listing `address` as a peer, ascending.
    pub fn in_neighbors(&self, address: &str) -> Vec<&str> {
        self.directed_neighbors(address, Direction::Incoming)
    }

    /// E / (V * (V - 1)); zero for fewer than two nodes.
    pub fn density(&self) -> f64 {
        let v = self.node_count();
        if v < 2 {
            return 0.0;
        }
        self.edge_count() as f64 / (v as f64 * (v as f64 - 1.0))
    }

    pub fn bidirectional_edge_count(&self) -> usize {
        self.edges().filter(|e| e.bidirectional).count()
    }

    fn directed_neighbors(&self, address: &str, direction: Direction) -> Vec<&str> {
        let Some(&ix) = self.index.get(address) else {
            return Vec::new();
        };
        let mut neighbours: Vec<&str> = self
            .graph
            .neighbors_directed(ix, direction)
            .map(|n| self.graph[n].address.as_str())
            .collect();
        neighbours.sort_unstable();
        neighbours
    }

    pub(crate) fn id(&self, address: &str) -> Option<usize> {
        self.index.get(address).map(|ix| ix.index())
    }

    pub(crate) fn address_of(&self, id: usize) -> &str {
        &self.graph[NodeIndex::new(id)].address
    }

    pub(crate) fn undirected_adjacency(&self) -> &[Vec<usize>] {
        &self.undirected
    }
}
