pub mod address;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod result;
pub mod source;

pub use address::{DEFAULT_PORT, normalize_address};
pub use crawler::{CrawlConfig, Crawler, ProgressCallback};
pub use error::ScanError;
pub use result::{CrawlProgress, CrawlSnapshot, CrawlStats, DiscoveredNode, NodeInfo, PeerEdge};
pub use source::{HttpPeerSource, PeerSource};
pub use tokio_util::sync::CancellationToken;
