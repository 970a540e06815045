//! Canonical peer addresses.
//!
//! Peers report each other as free-form strings (`"1.2.3.4"`,
//! `"http://1.2.3.4:1984"`, `"[::1]"`...). Everything the crawler stores or
//! looks up is keyed by the canonical `host:port` form produced here.

use std::net::Ipv6Addr;

/// Port assumed when a peer string carries none.
pub const DEFAULT_PORT: u16 = 1984;

/// Normalize a peer-reported string into `host:port` (or `[v6]:port`).
///
/// Returns `None` for anything that is not a literal IPv4 address or a
/// bracketed IPv6 address; callers drop those silently.
pub fn normalize_address(raw: &str) -> Option<String> {
    let mut candidate = raw.trim();
    if let Some(stripped) = candidate.strip_suffix('/') {
        candidate = stripped;
    }
    if let Some((_, rest)) = candidate.split_once("://") {
        candidate = rest;
    }
    if candidate.is_empty() {
        return None;
    }

    if candidate.starts_with('[') {
        normalize_ipv6(candidate)
    } else {
        normalize_ipv4(candidate)
    }
}

/// Same as [`normalize_address`] but keeps the default port configurable.
pub fn normalize_address_with_port(raw: &str, default_port: u16) -> Option<String> {
    let normalized = normalize_address(raw)?;
    if default_port == DEFAULT_PORT || has_explicit_port(raw) {
        return Some(normalized);
    }
    let (host, _) = normalized.rsplit_once(':')?;
    Some(format!("{}:{}", host, default_port))
}

fn has_explicit_port(raw: &str) -> bool {
    let trimmed = raw.trim().trim_end_matches('/');
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    match without_scheme.rfind(']') {
        Some(close) => without_scheme[close + 1..].starts_with(':'),
        None => without_scheme.contains(':'),
    }
}

fn normalize_ipv6(candidate: &str) -> Option<String> {
    let close = candidate.find(']')?;
    let host: Ipv6Addr = candidate[1..close].parse().ok()?;
    let port = match &candidate[close + 1..] {
        "" => DEFAULT_PORT,
        rest => parse_port(rest.strip_prefix(':')?)?,
    };
    Some(format!("[{}]:{}", host, port))
}

fn normalize_ipv4(candidate: &str) -> Option<String> {
    let (host, port) = match candidate.split_once(':') {
        Some((host, port)) => (host, parse_port(port)?),
        None => (candidate, DEFAULT_PORT),
    };

    let octets = host
        .split('.')
        .map(parse_octet)
        .collect::<Option<Vec<u8>>>()?;
    if octets.len() != 4 {
        return None;
    }

    Some(format!(
        "{}.{}.{}.{}:{}",
        octets[0], octets[1], octets[2], octets[3], port
    ))
}

fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u8>().ok()
}

fn parse_port(part: &str) -> Option<u16> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match part.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}
