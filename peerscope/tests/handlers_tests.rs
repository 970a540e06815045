use peerscope::commands::command_argument_builder;
use peerscope::handlers::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_parse_seed_line_plain_ipv4() {
    assert_eq!(
        parse_seed_line("1.2.3.4", 1984),
        Some("1.2.3.4:1984".to_string())
    );
}

#[test]
fn test_parse_seed_line_with_scheme_and_comment() {
    assert_eq!(
        parse_seed_line("http://5.6.7.8:1985   # gateway", 1984),
        Some("5.6.7.8:1985".to_string())
    );
}

#[test]
fn test_parse_seed_line_blank_and_comment_only() {
    assert_eq!(parse_seed_line("", 1984), None);
    assert_eq!(parse_seed_line("   ", 1984), None);
    assert_eq!(parse_seed_line("# just a comment", 1984), None);
}

#[test]
fn test_parse_seed_line_invalid() {
    assert_eq!(parse_seed_line("arweave.net", 1984), None);
}

#[test]
fn test_parse_seed_line_custom_port() {
    assert_eq!(
        parse_seed_line("[::1]", 8080),
        Some("[::1]:8080".to_string())
    );
}

#[test]
fn test_load_seeds_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "# seed nodes")?;
    writeln!(temp_file, "1.2.3.4")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "not-an-address")?;
    writeln!(temp_file, "[2001:db8::1]:1984")?;

    let path = PathBuf::from(temp_file.path());
    let seeds = load_seeds_from_file(&path, 1984)?;

    assert_eq!(seeds, vec!["1.2.3.4:1984", "[2001:db8::1]:1984"]);
    Ok(())
}

#[test]
fn test_load_seeds_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let result = load_seeds_from_file(&path, 1984);

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("No valid seed addresses"));
}

#[test]
fn test_load_seeds_from_missing_file() {
    let path = PathBuf::from("/definitely/not/here/seeds.txt");
    let result = load_seeds_from_file(&path, 1984);
    assert!(result.unwrap_err().to_string().contains("Failed to read seeds file"));
}

#[test]
fn test_load_seeds_from_source_merges_and_dedupes() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "1.2.3.4:1984")?;
    writeln!(temp_file, "9.9.9.9")?;
    let path = PathBuf::from(temp_file.path());

    let seeds = load_seeds_from_source(
        &["http://1.2.3.4".to_string(), "bogus".to_string()],
        Some(&path),
        1984,
    )?;

    assert_eq!(seeds, vec!["1.2.3.4:1984", "9.9.9.9:1984"]);
    Ok(())
}

#[test]
fn test_load_seeds_from_source_no_input() {
    let result = load_seeds_from_source(&[], None, 1984);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("At least one valid --seed")
    );
}

#[test]
fn test_crawl_config_from_default_args() {
    let matches = command_argument_builder().get_matches_from(["peerscope", "crawl", "-s", "1.2.3.4"]);
    let (_, crawl) = matches.subcommand().unwrap();
    let config = crawl_config_from_args(crawl);

    assert_eq!(config.max_nodes, 1000);
    assert_eq!(config.concurrency, 10);
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.request_delay, Duration::from_millis(100));
    assert_eq!(config.retries, 2);
    assert_eq!(config.default_port, 1984);
}

#[test]
fn test_crawl_config_from_explicit_args() {
    let matches = command_argument_builder().get_matches_from([
        "peerscope",
        "crawl",
        "--seed",
        "1.2.3.4",
        "--seed",
        "5.6.7.8",
        "-n",
        "50",
        "-t",
        "4",
        "--timeout",
        "2",
        "--delay",
        "0",
        "--retries",
        "5",
        "--port",
        "8080",
    ]);
    let (_, crawl) = matches.subcommand().unwrap();
    let config = crawl_config_from_args(crawl);

    assert_eq!(config.max_nodes, 50);
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.request_timeout, Duration::from_secs(2));
    assert_eq!(config.request_delay, Duration::ZERO);
    assert_eq!(config.retries, 5);
    assert_eq!(config.default_port, 8080);

    let seeds: Vec<&String> = crawl.get_many::<String>("seed").unwrap().collect();
    assert_eq!(seeds.len(), 2);
}

#[test]
fn test_rejects_unknown_format() {
    let result = command_argument_builder().try_get_matches_from([
        "peerscope", "crawl", "-s", "1.2.3.4", "--format", "csv",
    ]);
    assert!(result.is_err());
}
