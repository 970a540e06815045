use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use peerscope_core::crawl::{CrawlOptions, execute_crawl};
use peerscope_core::report::{ReportFormat, generate_text_report};
use peerscope_scanner::address::normalize_address_with_port;
use peerscope_scanner::{CancellationToken, CrawlConfig, DEFAULT_PORT};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// Helper functions for crawl handler

/// Install the global tracing subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse a single seed line: blank lines and `#` comments yield `None`, as do
/// addresses that do not normalize.
pub fn parse_seed_line(line: &str, default_port: u16) -> Option<String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }
    let parsed = normalize_address_with_port(line, default_port);
    if parsed.is_none() {
        warn!("Skipping invalid seed address '{}'", line);
    }
    parsed
}

/// Load and normalize seed addresses from a file
pub fn load_seeds_from_file(path: &Path, default_port: u16) -> Result<Vec<String>> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let content = fs::read_to_string(&expanded)
        .with_context(|| format!("Failed to read seeds file {}", expanded))?;

    let seeds: Vec<String> = content
        .lines()
        .filter_map(|line| parse_seed_line(line, default_port))
        .collect();

    if seeds.is_empty() {
        bail!("No valid seed addresses found in {}", expanded);
    }

    Ok(seeds)
}

/// Combine `--seed` values and an optional seeds file, dropping duplicates
/// while keeping first-seen order.
pub fn load_seeds_from_source(
    seeds: &[String],
    seeds_file: Option<&PathBuf>,
    default_port: u16,
) -> Result<Vec<String>> {
    let mut all = Vec::new();
    for seed in seeds {
        match normalize_address_with_port(seed, default_port) {
            Some(address) => all.push(address),
            None => eprintln!("{} Skipping invalid seed address '{}'", "⚠".yellow(), seed),
        }
    }
    if let Some(path) = seeds_file {
        all.extend(load_seeds_from_file(path, default_port)?);
    }

    let mut seen = std::collections::HashSet::new();
    all.retain(|address| seen.insert(address.clone()));

    if all.is_empty() {
        bail!("At least one valid --seed or a --seeds-file must be provided");
    }
    Ok(all)
}

/// Map `crawl` arguments onto a crawler configuration
pub fn crawl_config_from_args(args: &ArgMatches) -> CrawlConfig {
    let defaults = CrawlConfig::default();
    CrawlConfig::default()
        .with_max_nodes(
            args.get_one::<usize>("max-nodes")
                .copied()
                .unwrap_or(defaults.max_nodes),
        )
        .with_concurrency(
            args.get_one::<usize>("threads")
                .copied()
                .unwrap_or(defaults.concurrency),
        )
        .with_request_timeout(
            args.get_one::<u64>("timeout")
                .map(|secs| Duration::from_secs(*secs))
                .unwrap_or(defaults.request_timeout),
        )
        .with_request_delay(
            args.get_one::<u64>("delay")
                .map(|millis| Duration::from_millis(*millis))
                .unwrap_or(defaults.request_delay),
        )
        .with_retries(args.get_one::<u32>("retries").copied().unwrap_or(defaults.retries))
        .with_default_port(args.get_one::<u16>("port").copied().unwrap_or(DEFAULT_PORT))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let config = crawl_config_from_args(sub_matches);
    config
        .validate()
        .context("Invalid crawl configuration")?;

    let seed_args: Vec<String> = sub_matches
        .get_many::<String>("seed")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let seeds_file = sub_matches.get_one::<PathBuf>("seeds-file");
    let seeds = load_seeds_from_source(&seed_args, seeds_file, config.default_port)?;

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let top = sub_matches.get_one::<usize>("top").copied().unwrap_or(10);
    let output = sub_matches.get_one::<PathBuf>("output");
    let show_progress = !quiet && format == ReportFormat::Text;

    if show_progress {
        println!("\n🕸️  Crawling from {} seed(s)", seeds.len());
        println!("Workers: {}", config.concurrency);
        println!("Node budget: {}", config.max_nodes);
        println!(
            "Timeout: {}s, retries: {}, delay: {}ms\n",
            config.request_timeout.as_secs(),
            config.retries,
            config.request_delay.as_millis()
        );
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{} Interrupted, finishing in-flight nodes...", "⚠".yellow());
            ctrl_c.cancel();
        }
    });

    let options = CrawlOptions {
        seeds,
        config,
        show_progress_bars: show_progress,
    };
    let outcome = execute_crawl(options, None, Some(cancel))
        .await
        .context("Crawl failed")?;

    let export = outcome.graph.export();
    if let Some(path) = output {
        export
            .write_json(path)
            .with_context(|| format!("Failed to write graph to {}", path.display()))?;
        if show_progress {
            println!("{} Graph written to {}", "✓".green().bold(), path.display());
        }
    }

    match format {
        ReportFormat::Json => {
            println!("{}", export.to_json().context("Failed to serialize graph")?);
        }
        ReportFormat::Text => {
            if show_progress {
                println!();
                print_divider();
                println!("{}", "  CRAWL REPORT".bright_white().bold());
                print_divider();
                println!();
            }
            print!(
                "{}",
                generate_text_report(&outcome.graph, &outcome.snapshot.stats, top)
            );
        }
    }

    Ok(())
}
