// Report generation from a crawled peer graph

use crate::graph::PeerGraph;
use colored::Colorize;
use peerscope_scanner::CrawlStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

fn divider() -> String {
    "━".repeat(52)
}

/// Generate the human-readable summary of a crawl and its graph metrics
pub fn generate_text_report(graph: &PeerGraph, stats: &CrawlStats, top: usize) -> String {
    let summary = graph.summary();
    let mut report = String::new();

    report.push_str(&divider());
    report.push_str("\n\n");
    report.push_str(&format!("{}\n", "# Crawl:".bold()));
    report.push_str(&format!(
        "  Nodes crawled: {} ({} responsive, {} failed)\n",
        stats.discovered, stats.responsive, stats.failed
    ));
    report.push_str(&format!("  Edges observed: {}\n", stats.edges));
    report.push_str(&format!("  Elapsed: {:.1}s\n", stats.elapsed.as_secs_f64()));
    if stats.cancelled {
        report.push_str(&format!("  {}\n", "Crawl was cancelled; results are partial".yellow()));
    }

    report.push('\n');
    report.push_str(&format!("{}\n", "# Topology:".bold()));
    report.push_str(&format!(
        "  Nodes: {} ({} responsive, {} unresponsive or unreached)\n",
        summary.node_count, summary.responsive_nodes, summary.unresponsive_nodes
    ));
    report.push_str(&format!(
        "  Edges: {} ({} bidirectional, reciprocity {:.1}%)\n",
        summary.edge_count,
        summary.bidirectional_edges,
        summary.reciprocity * 100.0
    ));
    report.push_str(&format!("  Density: {:.6}\n", summary.density));
    report.push_str(&format!(
        "  Degree: avg {:.2}, max {}\n",
        summary.avg_degree, summary.max_degree
    ));
    report.push_str(&format!(
        "  Avg clustering coefficient: {:.4}\n",
        summary.avg_clustering
    ));
    report.push_str(&format!(
        "  Connected components: {} (largest {})\n",
        summary.component_count, summary.largest_component
    ));

    report.push('\n');
    report.push_str(&divider());
    report.push_str("\n\n");

    report.push_str(&format!("{}\n", "## Top nodes by betweenness".bold()));
    for (rank, (address, score)) in graph.top_by_betweenness(top).iter().enumerate() {
        report.push_str(&format!(
            "  {:>2}. {:<45} {:.4}  (degree {})\n",
            rank + 1,
            address,
            score,
            graph.degree(address)
        ));
    }

    report.push('\n');
    report.push_str(&format!("{}\n", "## Top nodes by degree".bold()));
    for (rank, (address, degree)) in graph.top_by_degree(top).iter().enumerate() {
        let marker = match graph.node(address) {
            Some(node) if node.responsive => "up".green(),
            _ => "down".red(),
        };
        report.push_str(&format!(
            "  {:>2}. {:<45} {:>5}  in {} / out {}  {}\n",
            rank + 1,
            address,
            degree,
            graph.in_degree(address),
            graph.out_degree(address),
            marker
        ));
    }
    report.push('\n');

    report
}
