// Generic {nodes, edges} projection of a peer graph with per-node metrics

use crate::graph::PeerGraph;
use crate::metrics::GraphSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub summary: GraphSummary,
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportNode {
    pub address: String,
    pub responsive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_peer_count: Option<u64>,
    pub discovered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    pub in_degree: usize,
    pub out_degree: usize,
    pub degree: usize,
    pub clustering: f64,
    pub betweenness: f64,
    pub component: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEdge {
    pub source: String,
    pub target: String,
    pub discovered_at: DateTime<Utc>,
    pub bidirectional: bool,
}

impl PeerGraph {
    /// Project the graph and its per-node metrics into a serializable record.
    pub fn export(&self) -> GraphExport {
        let betweenness = self.betweenness_by_id();
        let components = self.component_labels();

        let nodes = self
            .nodes()
            .enumerate()
            .map(|(id, node)| {
                let info = node.info.as_ref();
                ExportNode {
                    address: node.address.clone(),
                    responsive: node.responsive,
                    network: info.and_then(|i| i.network.clone()),
                    version: info.and_then(|i| i.version),
                    height: info.and_then(|i| i.height),
                    reported_peer_count: info.and_then(|i| i.reported_peer_count),
                    discovered_at: node.discovered_at,
                    last_seen: node.last_seen,
                    in_degree: self.in_degree(&node.address),
                    out_degree: self.out_degree(&node.address),
                    degree: self.degree(&node.address),
                    clustering: self.clustering_by_id(id),
                    betweenness: betweenness[id],
                    component: components[id],
                }
            })
            .collect();

        let edges = self
            .edges()
            .map(|edge| ExportEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                discovered_at: edge.discovered_at,
                bidirectional: edge.bidirectional,
            })
            .collect();

        GraphExport {
            summary: self.summary(),
            nodes,
            edges,
        }
    }
}

impl GraphExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()
    }
}
