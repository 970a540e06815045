use crate::address::{DEFAULT_PORT, normalize_address_with_port};
use crate::error::{Result, ScanError};
use crate::frontier::{Frontier, Pop};
use crate::result::{CrawlProgress, CrawlSnapshot, CrawlStats, DiscoveredNode, NodeInfo, PeerEdge};
use crate::source::{HttpPeerSource, PeerSource};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(CrawlProgress) + Send + Sync>;

/// Knobs for one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Node budget (N): at most this many addresses are ever processed.
    pub max_nodes: usize,
    /// Number of workers (C) draining the frontier.
    pub concurrency: usize,
    /// Timeout (T) applied to every individual request.
    pub request_timeout: Duration,
    /// Pause (D) each worker takes after finishing a node.
    pub request_delay: Duration,
    /// Fetch attempts per node (R). Values below 1 are treated as 1.
    pub retries: u32,
    /// Backoff before attempt `n` (1-based retry) is `retry_backoff * n`.
    pub retry_backoff: Duration,
    pub progress_interval: Duration,
    /// Port applied to peer strings that carry none.
    pub default_port: u16,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1000,
            concurrency: 10,
            request_timeout: Duration::from_secs(5),
            request_delay: Duration::from_millis(100),
            retries: 2,
            retry_backoff: Duration::from_millis(500),
            progress_interval: Duration::from_secs(2),
            default_port: DEFAULT_PORT,
        }
    }
}

impl CrawlConfig {
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_nodes == 0 {
            return Err(ScanError::InvalidConfig("node budget must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(ScanError::InvalidConfig("concurrency must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ScanError::InvalidConfig("request timeout must be non-zero".into()));
        }
        if self.progress_interval.is_zero() {
            return Err(ScanError::InvalidConfig("progress interval must be non-zero".into()));
        }
        if self.default_port == 0 {
            return Err(ScanError::InvalidConfig("default port must be non-zero".into()));
        }
        Ok(())
    }

    fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

/// Shared state of one crawl invocation. Every lock is held only for
/// bookkeeping, never across a request.
struct CrawlState {
    frontier: Mutex<Frontier>,
    nodes: Mutex<HashMap<String, DiscoveredNode>>,
    edges: Mutex<Vec<PeerEdge>>,
    wake: Notify,
    responsive: AtomicUsize,
    failed: AtomicUsize,
}

impl CrawlState {
    fn new(max_nodes: usize) -> Self {
        Self {
            frontier: Mutex::new(Frontier::new(max_nodes)),
            nodes: Mutex::new(HashMap::new()),
            edges: Mutex::new(Vec::new()),
            wake: Notify::new(),
            responsive: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    async fn progress(&self) -> CrawlProgress {
        let (queued, in_flight) = {
            let frontier = self.frontier.lock().await;
            (frontier.queued_len(), frontier.in_flight())
        };
        let discovered = self.nodes.lock().await.len();
        let edges = self.edges.lock().await.len();

        CrawlProgress {
            discovered,
            responsive: self.responsive.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            queued,
            in_flight,
            edges,
        }
    }
}

enum Visit {
    Responsive {
        info: NodeInfo,
        peers: Vec<String>,
        attempts: u32,
    },
    Failed {
        info: Option<NodeInfo>,
        attempts: u32,
    },
    Cancelled,
}

/// Breadth-first peer crawler driving a fixed pool of workers over a
/// [`PeerSource`].
pub struct Crawler<S: PeerSource> {
    source: Arc<S>,
    config: Arc<CrawlConfig>,
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Crawler<HttpPeerSource> {
    /// Crawler talking HTTP, with the client timeout taken from `config`.
    pub fn http(config: CrawlConfig) -> Result<Self> {
        let source = HttpPeerSource::with_timeout(config.request_timeout)?;
        Ok(Self::new(source, config))
    }
}

impl<S: PeerSource> Crawler<S> {
    pub fn new(source: S, config: CrawlConfig) -> Self {
        Self {
            source: Arc::new(source),
            config: Arc::new(config),
            progress_callback: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Stop the crawl early when `token` is cancelled. The snapshot gathered
    /// so far is still returned.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub async fn crawl(&self, seeds: &[String]) -> Result<CrawlSnapshot> {
        self.config.validate()?;
        let started = Instant::now();
        let state = Arc::new(CrawlState::new(self.config.max_nodes));

        let mut usable_seeds = 0;
        {
            let mut frontier = state.frontier.lock().await;
            for seed in seeds {
                match normalize_address_with_port(seed, self.config.default_port) {
                    Some(address) => {
                        usable_seeds += 1;
                        frontier.push(address);
                    }
                    None => warn!("Ignoring invalid seed address {:?}", seed),
                }
            }
        }
        if usable_seeds == 0 {
            return Err(ScanError::NoSeeds(seeds.len()));
        }

        info!(
            "Starting crawl from {} seed(s) with {} workers (budget {} nodes)",
            usable_seeds, self.config.concurrency, self.config.max_nodes
        );

        let reporter_stop = self.cancel.child_token();
        let reporter = tokio::spawn(report_progress(
            state.clone(),
            self.config.progress_interval,
            self.progress_callback.clone(),
            reporter_stop.clone(),
        ));

        let worker_handles: Vec<_> = (0..self.config.concurrency)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    self.source.clone(),
                    state.clone(),
                    self.config.clone(),
                    self.cancel.clone(),
                ))
            })
            .collect();

        // The reporter is stopped even when a worker failed.
        let joined = futures::future::join_all(worker_handles).await;
        reporter_stop.cancel();
        let reported = reporter.await;
        for worker in joined {
            worker?;
        }
        reported?;

        let final_progress = state.progress().await;
        if let Some(ref callback) = self.progress_callback {
            callback(final_progress);
        }

        let visited = state.frontier.lock().await.visited_len();
        let nodes = std::mem::take(&mut *state.nodes.lock().await);
        let edges = std::mem::take(&mut *state.edges.lock().await);
        debug_assert_eq!(visited, nodes.len());

        let responsive = nodes.values().filter(|n| n.responsive).count();
        let stats = CrawlStats {
            discovered: nodes.len(),
            responsive,
            failed: nodes.len() - responsive,
            edges: edges.len(),
            elapsed: started.elapsed(),
            cancelled: self.cancel.is_cancelled(),
        };

        info!(
            "Crawl complete. {} nodes ({} responsive, {} failed), {} edges in {:.1}s",
            stats.discovered,
            stats.responsive,
            stats.failed,
            stats.edges,
            stats.elapsed.as_secs_f64()
        );

        Ok(CrawlSnapshot {
            nodes,
            edges,
            stats,
        })
    }
}

async fn run_worker<S: PeerSource>(
    worker_id: usize,
    source: Arc<S>,
    state: Arc<CrawlState>,
    config: Arc<CrawlConfig>,
    cancel: CancellationToken,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // Registered before popping so a wake-up between pop and wait is not lost.
        let wake = state.wake.notified();
        let next = state.frontier.lock().await.pop();

        let address = match next {
            Pop::Next(address) => address,
            Pop::Idle => {
                tokio::select! {
                    _ = wake => continue,
                    _ = cancel.cancelled() => break,
                }
            }
            Pop::Done => {
                state.wake.notify_waiters();
                break;
            }
        };

        state
            .nodes
            .lock()
            .await
            .insert(address.clone(), DiscoveredNode::new(address.clone()));

        let outcome = visit(source.as_ref(), &config, &cancel, &address).await;
        let cancelled = matches!(outcome, Visit::Cancelled);
        record_visit(&state, &config, &address, outcome).await;

        state.frontier.lock().await.complete();
        state.wake.notify_waiters();

        if cancelled {
            break;
        }
        if !config.request_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(config.request_delay) => {}
                _ = cancel.cancelled() => break,
            }
        }
    }

    debug!("Worker {} finished", worker_id);
}

/// Fetch metadata and peer list for one node, retrying with linear backoff.
async fn visit<S: PeerSource>(
    source: &S,
    config: &CrawlConfig,
    cancel: &CancellationToken,
    address: &str,
) -> Visit {
    let attempts = config.attempts();
    let mut last_info = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let backoff = config.retry_backoff * attempt;
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                _ = cancel.cancelled() => return Visit::Cancelled,
            }
        }

        let info = tokio::select! {
            fetched = tokio::time::timeout(config.request_timeout, source.fetch_node_info(address)) => {
                fetched.ok().flatten()
            }
            _ = cancel.cancelled() => return Visit::Cancelled,
        };
        let Some(info) = info else {
            debug!("No metadata from {} (attempt {}/{})", address, attempt + 1, attempts);
            continue;
        };
        last_info = Some(info.clone());

        let peers = tokio::select! {
            fetched = tokio::time::timeout(config.request_timeout, source.fetch_peer_list(address)) => {
                fetched.ok().flatten()
            }
            _ = cancel.cancelled() => return Visit::Cancelled,
        };
        match peers {
            Some(peers) => {
                return Visit::Responsive {
                    info,
                    peers,
                    attempts: attempt + 1,
                };
            }
            None => debug!("No peer list from {} (attempt {}/{})", address, attempt + 1, attempts),
        }
    }

    Visit::Failed {
        info: last_info,
        attempts,
    }
}

async fn record_visit(state: &CrawlState, config: &CrawlConfig, address: &str, outcome: Visit) {
    match outcome {
        Visit::Responsive {
            info,
            peers,
            attempts,
        } => {
            if let Some(node) = state.nodes.lock().await.get_mut(address) {
                node.mark_responsive(info, attempts);
            }
            state.responsive.fetch_add(1, Ordering::Relaxed);

            let mut seen = HashSet::new();
            let targets: Vec<String> = peers
                .iter()
                .filter_map(|raw| normalize_address_with_port(raw, config.default_port))
                .filter(|target| target != address && seen.insert(target.clone()))
                .collect();

            state.edges.lock().await.extend(
                targets
                    .iter()
                    .map(|target| PeerEdge::new(address.to_string(), target.clone())),
            );

            let queued = {
                let mut frontier = state.frontier.lock().await;
                targets
                    .into_iter()
                    .filter(|target| frontier.push(target.clone()))
                    .count()
            };
            debug!(
                "{} reported {} peer(s), {} valid, {} newly queued",
                address,
                peers.len(),
                seen.len(),
                queued
            );
        }
        Visit::Failed { info, attempts } => {
            if let Some(node) = state.nodes.lock().await.get_mut(address) {
                node.mark_failed(info, attempts);
            }
            state.failed.fetch_add(1, Ordering::Relaxed);
            debug!("{} unresponsive after {} attempt(s)", address, attempts);
        }
        Visit::Cancelled => {
            // Left unresponsive in the registry, so it counts as failed.
            state.failed.fetch_add(1, Ordering::Relaxed);
            debug!("Visit to {} abandoned on cancellation", address);
        }
    }
}

async fn report_progress(
    state: Arc<CrawlState>,
    interval: Duration,
    callback: Option<ProgressCallback>,
    stop: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let progress = state.progress().await;
                info!(
                    discovered = progress.discovered,
                    responsive = progress.responsive,
                    failed = progress.failed,
                    queued = progress.queued,
                    edges = progress.edges,
                    "Crawl progress"
                );
                if let Some(ref callback) = callback {
                    callback(progress);
                }
            }
        }
    }
}
