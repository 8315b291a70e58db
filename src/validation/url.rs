use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Url;

use crate::validation::{Outcome, Validator};

// Schemes recognized without "://" (javascript:alert(1), mailto:x@y).
const BARE_SCHEMES: [&str; 6] = ["javascript", "data", "vbscript", "file", "mailto", "ftp"];

// Punctuation that separates a URL from neighbouring text within one word.
const SEGMENT_BREAKS: [char; 8] = [',', ';', '"', '\'', '<', '>', '\u{ab}', '\u{bb}'];

/// UrlPolicy
///
/// What a URL found in user content must satisfy.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    pub allowed_schemes: Vec<String>,
    /// Exact host or any subdomain of it.
    pub blocked_hosts: Vec<String>,
    /// Empty means every host not blocked is fine.
    pub allowed_hosts: Vec<String>,
    /// Resolve domains through DNS and reject the ones that do not resolve to a
    /// public address.
    pub resolve_hosts: bool,
    /// Bound on one whole `check` call, DNS retries included.
    pub timeout: Duration,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            blocked_hosts: Vec::new(),
            allowed_hosts: Vec::new(),
            resolve_hosts: false,
            timeout: Duration::from_secs(3),
        }
    }
}

/// HostResolver
///
/// DNS seam for the URL validator.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// System resolver via `tokio::net::lookup_host`.
pub struct DnsResolver;

#[async_trait]
impl HostResolver for DnsResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// UrlValidator
///
/// Finds URL-like substrings in text and rejects the text when any of them fails the
/// policy: disallowed scheme, blocked or non-allow-listed host, a loopback/private
/// address, or (with `resolve_hosts`) a host that does not resolve. Running out of time
/// is reported as `Outcome::TimedOut`, never as an error.
pub struct UrlValidator {
    policy: UrlPolicy,
    resolver: Arc<dyn HostResolver>,
}

enum Resolution {
    Public,
    Rejected(&'static str),
    Transient,
}

impl UrlValidator {
    pub fn new(policy: UrlPolicy) -> Self {
        Self::with_resolver(policy, Arc::new(DnsResolver))
    }

    pub fn with_resolver(mut policy: UrlPolicy, resolver: Arc<dyn HostResolver>) -> Self {
        policy.allowed_schemes = normalize(&policy.allowed_schemes);
        policy.blocked_hosts = normalize(&policy.blocked_hosts);
        policy.allowed_hosts = normalize(&policy.allowed_hosts);
        Self { policy, resolver }
    }

    async fn inspect(&self, text: &str) -> Outcome {
        for candidate in extract_urls(text) {
            let outcome = self.inspect_url(&candidate).await;
            if !outcome.is_valid() {
                return outcome;
            }
        }
        Outcome::Valid
    }

    async fn inspect_url(&self, candidate: &str) -> Outcome {
        let Some(url) = parse_candidate(candidate) else {
            return Outcome::invalid(format!("malformed URL \"{candidate}\""));
        };

        if !self.policy.allowed_schemes.iter().any(|s| s == url.scheme()) {
            return Outcome::invalid(format!("URL \"{candidate}\" uses a disallowed scheme"));
        }

        let Some(host) = url.host_str().map(|h| h.trim_end_matches('.').to_lowercase()) else {
            return Outcome::invalid(format!("URL \"{candidate}\" has no host"));
        };

        if self.policy.blocked_hosts.iter().any(|b| host_matches(&host, b)) {
            return Outcome::invalid(format!("URL \"{candidate}\" is blocked"));
        }

        if !self.policy.allowed_hosts.is_empty()
            && !self.policy.allowed_hosts.iter().any(|a| host_matches(&host, a))
        {
            return Outcome::invalid(format!("URL \"{candidate}\" is not allow-listed"));
        }

        if let Some(ip) = ip_literal(&host) {
            if !is_public(ip) {
                return Outcome::invalid(format!("URL \"{candidate}\" points to a private address"));
            }
            return Outcome::Valid;
        }

        if !self.policy.resolve_hosts {
            return Outcome::Valid;
        }

        match self.resolve_with_retry(&host).await {
            Resolution::Public => Outcome::Valid,
            Resolution::Rejected(why) => Outcome::invalid(format!("URL \"{candidate}\" {why}")),
            Resolution::Transient => Outcome::TimedOut,
        }
    }

    // One retry on a transient failure, then give up.
    async fn resolve_with_retry(&self, host: &str) -> Resolution {
        for attempt in 1..=2 {
            match self.resolver.resolve(host).await {
                Ok(addrs) if addrs.is_empty() => return Resolution::Rejected("does not resolve"),
                Ok(addrs) if addrs.iter().copied().all(is_public) => return Resolution::Public,
                Ok(_) => return Resolution::Rejected("resolves to a private address"),
                Err(e) if is_transient(&e) => {
                    tracing::debug!(host = %host, attempt, error = %e, "transient DNS failure");
                }
                Err(_) => return Resolution::Rejected("does not resolve"),
            }
        }
        Resolution::Transient
    }
}

#[async_trait]
impl Validator for UrlValidator {
    fn name(&self) -> &'static str {
        "url"
    }

    async fn check(&self, text: &str) -> Outcome {
        match tokio::time::timeout(self.policy.timeout, self.inspect(text)).await {
            Ok(outcome) => {
                if let Some(reason) = outcome.reason() {
                    tracing::warn!(reason = %reason, "URL rejected");
                }
                outcome
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.policy.timeout.as_millis() as u64, "URL check timed out");
                Outcome::TimedOut
            }
        }
    }
}

/// Pulls URL-like substrings out of free text, in order of appearance.
///
/// Text is cut into segments on whitespace and on punctuation that never joins a
/// host to its surroundings (`,` `;` quotes, angle brackets, guillemets). Each
/// segment is then cut at colons that do not belong to a scheme, a port or a
/// bracketed IPv6 literal, so "see:evil.test" yields "evil.test". A piece counts
/// when it carries "://", starts with a known bare scheme ("javascript:"), or looks
/// like a domain ("evil.test", "www.site.com/page").
pub fn extract_urls(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || SEGMENT_BREAKS.contains(&c))
        .flat_map(split_colons)
        .map(trim_wrapping)
        .filter(|token| !token.is_empty())
        .filter(|token| token.contains("://") || bare_scheme(token).is_some() || looks_like_domain(token))
        .map(str::to_string)
        .collect()
}

// Cuts at every colon outside brackets unless it starts "://", a port, or ends a
// bare scheme name.
fn split_colons(segment: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;

    for (i, c) in segment.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                let head = &segment[start..i];
                let rest = &segment[i + 1..];
                let joined = rest.starts_with("//")
                    || rest.starts_with(|c: char| c.is_ascii_digit())
                    || is_bare_scheme_name(head.trim_start_matches(['(', '[']));
                if !joined {
                    pieces.push(head);
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    pieces.push(&segment[start..]);
    pieces
}

// Strips sentence punctuation and brackets that wrap the token, keeping the ones
// the token itself opened ("javascript:alert(1)" stays whole).
fn trim_wrapping(mut token: &str) -> &str {
    loop {
        let before = token.len();
        token = token
            .trim_start_matches(['<', '"', '\'', '\u{ab}'])
            .trim_end_matches(['.', ',', ';', ':', '!', '?', '>', '"', '\'', '\u{bb}']);

        for (open, close) in [('(', ')'), ('[', ']')] {
            let opens = token.matches(open).count();
            let closes = token.matches(close).count();
            if token.len() >= 2 && token.starts_with(open) && token.ends_with(close) {
                token = &token[1..token.len() - 1];
            } else if token.starts_with(open) && opens > closes {
                token = &token[1..];
            } else if token.ends_with(close) && closes > opens {
                token = &token[..token.len() - 1];
            }
        }

        if token.len() == before {
            return token;
        }
    }
}

fn is_bare_scheme_name(head: &str) -> bool {
    BARE_SCHEMES.iter().any(|scheme| head.eq_ignore_ascii_case(scheme))
}

fn bare_scheme(token: &str) -> Option<&'static str> {
    let lower = token.to_ascii_lowercase();
    BARE_SCHEMES
        .into_iter()
        .find(|scheme| lower.strip_prefix(scheme).is_some_and(|rest| rest.starts_with(':')))
}

fn looks_like_domain(token: &str) -> bool {
    let host = token
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    // Drop userinfo and port.
    let host = host.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels
        .iter()
        .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    let tld = labels[labels.len() - 1];

    (labels_ok && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        || host.parse::<Ipv4Addr>().is_ok()
}

fn parse_candidate(candidate: &str) -> Option<Url> {
    let explicit = candidate.contains("://") || bare_scheme(candidate).is_some();
    if explicit {
        Url::parse(candidate).ok()
    } else {
        Url::parse(&format!("http://{candidate}")).ok()
    }
}

fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern
        || host
            .strip_suffix(pattern)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn ip_literal(host: &str) -> Option<IpAddr> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    bare.parse().ok()
}

fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => {
                !(v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_multicast()
                    || is_unique_local(v6)
                    || is_unicast_link_local(v6))
            }
        },
    }
}

fn is_public_v4(v4: Ipv4Addr) -> bool {
    let [first, second, ..] = v4.octets();
    !(v4.is_loopback()
        || v4.is_private()
        || v4.is_link_local()
        || v4.is_unspecified()
        || v4.is_broadcast()
        || v4.is_multicast()
        // 0.0.0.0/8 "this network"
        || first == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (first == 100 && (second & 0xc0) == 64))
}

// fc00::/7
fn is_unique_local(v6: Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xfe00) == 0xfc00
}

// fe80::/10
fn is_unicast_link_local(v6: Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xffc0) == 0xfe80
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

fn normalize(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim().trim_end_matches('.').to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
