pub mod components;
pub mod crawl;
pub mod export;
pub mod graph;
pub mod metrics;
pub mod report;

pub use export::{ExportEdge, ExportNode, GraphExport};
pub use graph::PeerGraph;
pub use metrics::GraphSummary;

use colored::Colorize;

const BANNER: &str = r#"
  ___
 | _ \___ ___ _ _ ___ ____ ___ _ __  ___
 |  _/ -_) -_) '_(_-</ _/ _ \ '_ \/ -_)
 |_| \___\___|_| /__/\__\___/ .__/\___|
                            |_|        "#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "gossip topology crawler".bright_white(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
}
