use crate::graph::PeerGraph;
use indicatif::{ProgressBar, ProgressStyle};
use peerscope_scanner::{
    CancellationToken, CrawlConfig, CrawlProgress, CrawlSnapshot, Crawler, ScanError,
};
use std::sync::Arc;
use std::time::Duration;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub seeds: Vec<String>,
    pub config: CrawlConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress as display lines
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A finished crawl and the graph built from it.
pub struct CrawlOutcome {
    pub snapshot: CrawlSnapshot,
    pub graph: PeerGraph,
}

/// One-line rendering of a progress snapshot.
pub fn format_progress(progress: &CrawlProgress) -> String {
    format!(
        "Crawling... {} nodes ({} up, {} down), {} queued, {} in flight, {} edges",
        progress.discovered,
        progress.responsive,
        progress.failed,
        progress.queued,
        progress.in_flight,
        progress.edges
    )
}

/// Execute a crawl over HTTP and build the peer graph from its snapshot.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    cancel: Option<CancellationToken>,
) -> Result<CrawlOutcome, ScanError> {
    let CrawlOptions {
        seeds,
        config,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Starting crawl...");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(Arc::new(pb))
    } else {
        None
    };

    let pb_clone = progress_bar.clone();
    let message_callback = progress_callback.clone();
    let mut crawler = Crawler::http(config)?.with_progress_callback(Arc::new(
        move |progress: CrawlProgress| {
            let line = format_progress(&progress);
            if let Some(ref pb) = pb_clone {
                pb.set_message(line.clone());
            }
            if let Some(ref callback) = message_callback {
                callback(line);
            }
        },
    ));
    if let Some(token) = cancel {
        crawler = crawler.with_cancellation(token);
    }

    let result = crawler.crawl(&seeds).await;

    if let Some(ref pb) = progress_bar {
        match &result {
            Ok(snapshot) => pb.finish_with_message(format!(
                "Crawl complete! {} nodes, {} edges",
                snapshot.stats.discovered, snapshot.stats.edges
            )),
            Err(e) => pb.abandon_with_message(format!("Crawl failed: {}", e)),
        }
    }

    let snapshot = result?;
    let graph = PeerGraph::from_snapshot(&snapshot);
    Ok(CrawlOutcome { snapshot, graph })
}
