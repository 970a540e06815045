//! Structural metrics over a [`PeerGraph`].
//!
//! All metrics use the undirected view of the graph: two nodes are adjacent
//! when either one lists the other as a peer.

use crate::graph::PeerGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Headline numbers for one graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub responsive_nodes: usize,
    pub unresponsive_nodes: usize,
    pub bidirectional_edges: usize,
    /// Share of directed edges whose reverse was also observed.
    pub reciprocity: f64,
    pub density: f64,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub avg_clustering: f64,
    pub component_count: usize,
    pub largest_component: usize,
}

impl PeerGraph {
    /// Fraction of the node's neighbour pairs that are themselves connected.
    /// Zero for nodes with fewer than two neighbours or unknown addresses.
    pub fn clustering_coefficient(&self, address: &str) -> f64 {
        self.id(address)
            .map(|id| self.clustering_by_id(id))
            .unwrap_or(0.0)
    }

    /// Mean clustering coefficient over every node. Nodes with fewer than two
    /// neighbours count as zero rather than being left out.
    pub fn avg_clustering_coefficient(&self) -> f64 {
        let n = self.node_count();
        if n == 0 {
            return 0.0;
        }
        let total: f64 = (0..n).map(|id| self.clustering_by_id(id)).sum();
        total / n as f64
    }

    /// Normalized betweenness centrality for every node (Brandes).
    pub fn betweenness_centrality(&self) -> HashMap<String, f64> {
        self.betweenness_by_id()
            .into_iter()
            .enumerate()
            .map(|(id, score)| (self.address_of(id).to_string(), score))
            .collect()
    }

    /// Up to `k` nodes with the highest betweenness, ties by address.
    pub fn top_by_betweenness(&self, k: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.betweenness_by_id().into_iter().enumerate().collect();
        // Ids follow address order, so a stable sort keeps ties alphabetical.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(k)
            .map(|(id, score)| (self.address_of(id).to_string(), score))
            .collect()
    }

    /// Up to `k` nodes with the most distinct neighbours, ties by address.
    pub fn top_by_degree(&self, k: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(usize, usize)> = self
            .undirected_adjacency()
            .iter()
            .map(Vec::len)
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(k)
            .map(|(id, degree)| (self.address_of(id).to_string(), degree))
            .collect()
    }

    pub fn summary(&self) -> GraphSummary {
        let node_count = self.node_count();
        let edge_count = self.edge_count();
        let responsive_nodes = self.nodes().filter(|n| n.responsive).count();
        let bidirectional_edges = self.bidirectional_edge_count();
        let degrees = self.undirected_adjacency().iter().map(Vec::len);
        let (degree_total, max_degree) = degrees.fold((0usize, 0usize), |(sum, max), d| {
            (sum + d, max.max(d))
        });
        let components = self.connected_components();

        GraphSummary {
            node_count,
            edge_count,
            responsive_nodes,
            unresponsive_nodes: node_count - responsive_nodes,
            bidirectional_edges,
            reciprocity: if edge_count == 0 {
                0.0
            } else {
                bidirectional_edges as f64 / edge_count as f64
            },
            density: self.density(),
            avg_degree: if node_count == 0 {
                0.0
            } else {
                degree_total as f64 / node_count as f64
            },
            max_degree,
            avg_clustering: self.avg_clustering_coefficient(),
            component_count: components.len(),
            largest_component: components.first().map(Vec::len).unwrap_or(0),
        }
    }

    pub(crate) fn clustering_by_id(&self, id: usize) -> f64 {
        let adjacency = self.undirected_adjacency();
        let neighbours = &adjacency[id];
        let k = neighbours.len();
        if k < 2 {
            return 0.0;
        }

        let mut links = 0usize;
        for (i, &a) in neighbours.iter().enumerate() {
            for &b in &neighbours[i + 1..] {
                if adjacency[a].binary_search(&b).is_ok() {
                    links += 1;
                }
            }
        }

        links as f64 / (k * (k - 1) / 2) as f64
    }

    /// Brandes' algorithm on the undirected view, O(V·E) overall.
    ///
    /// Sources are processed in id order and all per-source state is reset
    /// only for the nodes that source reached, so isolated nodes cost O(1).
    pub(crate) fn betweenness_by_id(&self) -> Vec<f64> {
        let adjacency = self.undirected_adjacency();
        let n = adjacency.len();
        let mut centrality = vec![0.0f64; n];
        if n < 3 {
            return centrality;
        }

        let mut sigma = vec![0.0f64; n];
        let mut distance = vec![usize::MAX; n];
        let mut delta = vec![0.0f64; n];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut order: Vec<usize> = Vec::with_capacity(n);
        let mut queue = VecDeque::with_capacity(n);

        for source in 0..n {
            sigma[source] = 1.0;
            distance[source] = 0;
            queue.push_back(source);

            while let Some(v) = queue.pop_front() {
                order.push(v);
                let next = distance[v] + 1;
                for &w in &adjacency[v] {
                    if distance[w] == usize::MAX {
                        distance[w] = next;
                        queue.push_back(w);
                    }
                    if distance[w] == next {
                        sigma[w] += sigma[v];
                        predecessors[w].push(v);
                    }
                }
            }

            for &w in order.iter().rev() {
                let coefficient = (1.0 + delta[w]) / sigma[w];
                for &v in &predecessors[w] {
                    delta[v] += sigma[v] * coefficient;
                }
                if w != source {
                    centrality[w] += delta[w];
                }
            }

            for &v in &order {
                sigma[v] = 0.0;
                distance[v] = usize::MAX;
                delta[v] = 0.0;
                predecessors[v].clear();
            }
            order.clear();
        }

        let scale = 2.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        for score in &mut centrality {
            *score *= scale;
        }
        centrality
    }
}
