// src/job_import/url_guard.rs
//! SSRF guard for user-supplied job posting URLs.
//!
//! [`UrlGuard::check`] works on the textual host only: scheme allowlist, a
//! denylist of loopback names, and private-range prefix patterns. It never
//! touches the network. [`UrlGuard::check_literal`] and
//! [`UrlGuard::check_resolved`] look at the addresses themselves. For fetches,
//! resolved addresses are checked at connection time by
//! [`GuardedResolver`](super::resolver::GuardedResolver).

use super::error::BlockedUrlError;
use ipnet::IpNet;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::{Host, Url};

lazy_static! {
    // 10/8, 172.16/12, 192.168/16, 169.254/16, fc00::/7, fe80::/10
    static ref PRIVATE_HOST_PATTERNS: Vec<Regex> = [
        r"^10\.",
        r"^172\.(1[6-9]|2[0-9]|3[0-1])\.",
        r"^192\.168\.",
        r"^169\.254\.",
        r"^f[cd][0-9a-f]{2}:",
        r"^fe[89ab][0-9a-f]:",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect();
}

/// Upper bound on the DNS lookup in [`UrlGuard::check_resolved`].
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_BLOCKED_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "::1"];

const BLOCKED_NETWORKS: [&str; 10] = [
    "0.0.0.0/8",
    "10.0.0.0/8",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "::/128",
    "::1/128",
    "fc00::/7",
    "fe80::/10",
];

/// Immutable allow/deny configuration, built once and shared by every guard.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    allowed_schemes: HashSet<String>,
    blocked_hosts: HashSet<String>,
    private_patterns: Vec<Regex>,
    blocked_networks: Vec<IpNet>,
    allowed_hosts: HashSet<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: ["http", "https"].into_iter().map(String::from).collect(),
            blocked_hosts: DEFAULT_BLOCKED_HOSTS
                .into_iter()
                .map(String::from)
                .collect(),
            private_patterns: PRIVATE_HOST_PATTERNS.clone(),
            blocked_networks: BLOCKED_NETWORKS
                .iter()
                .filter_map(|cidr| cidr.parse().ok())
                .collect(),
            allowed_hosts: HashSet::new(),
        }
    }
}

impl UrlPolicy {
    /// Admit a host that the deny rules would otherwise refuse.
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.insert(normalize_host(&host.into()));
        self
    }

    /// Refuse an additional host by exact name.
    pub fn block_host(mut self, host: impl Into<String>) -> Self {
        self.blocked_hosts.insert(normalize_host(&host.into()));
        self
    }

    pub(crate) fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_hosts.contains(host)
    }

    pub(crate) fn is_blocked_addr(&self, ip: IpAddr) -> bool {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };
        self.blocked_networks.iter().any(|net| net.contains(&ip))
    }
}

/// Lowercase and strip IPv6 brackets so `[::1]` compares equal to `::1`.
fn normalize_host(host: &str) -> String {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct UrlGuard {
    policy: Arc<UrlPolicy>,
}

impl UrlGuard {
    pub fn new(policy: UrlPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> Arc<UrlPolicy> {
        Arc::clone(&self.policy)
    }

    pub fn is_valid(&self, url: &str) -> bool {
        self.check(url).is_ok()
    }

    /// Validate the textual URL, reporting why it was refused.
    pub fn check(&self, url: &str) -> Result<(), BlockedUrlError> {
        let parsed = Url::parse(url).map_err(|e| BlockedUrlError::Unparseable(e.to_string()))?;

        if !self.policy.allowed_schemes.contains(parsed.scheme()) {
            return Err(BlockedUrlError::DisallowedScheme(
                parsed.scheme().to_string(),
            ));
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .map(normalize_host)
            .ok_or(BlockedUrlError::NoHost)?;

        if self.policy.is_allowed_host(&host) {
            return Ok(());
        }

        if self.policy.blocked_hosts.contains(&host) {
            return Err(BlockedUrlError::BlockedHost(host));
        }

        if self
            .policy
            .private_patterns
            .iter()
            .any(|pattern| pattern.is_match(&host))
        {
            return Err(BlockedUrlError::PrivateRange(host));
        }

        Ok(())
    }

    /// Refuse IP-literal hosts inside the blocked networks.
    ///
    /// Catches literals the textual patterns miss, such as the IPv4-mapped
    /// form `[::ffff:7f00:1]`. Domain names pass; they are checked when
    /// resolved.
    pub fn check_literal(&self, url: &str) -> Result<(), BlockedUrlError> {
        let parsed = Url::parse(url).map_err(|e| BlockedUrlError::Unparseable(e.to_string()))?;
        let host = parsed.host().ok_or(BlockedUrlError::NoHost)?;
        let host_name = normalize_host(&host.to_string());

        let ip = match host {
            Host::Ipv4(ip) => IpAddr::V4(ip),
            Host::Ipv6(ip) => IpAddr::V6(ip),
            Host::Domain(_) => return Ok(()),
        };

        if !self.policy.is_allowed_host(&host_name) && self.policy.is_blocked_addr(ip) {
            return Err(BlockedUrlError::ResolvesToPrivate {
                host: host_name,
                addr: ip,
            });
        }

        Ok(())
    }

    /// Textual check plus a check of every address the host resolves to.
    ///
    /// This is a point-in-time answer for reporting. A host that fails to
    /// resolve, or whose lookup exceeds [`RESOLVE_TIMEOUT`], is let through;
    /// a fetch that follows reports it as a network failure or timeout.
    pub async fn check_resolved(&self, url: &str) -> Result<(), BlockedUrlError> {
        self.check(url)?;
        self.check_literal(url)?;

        let parsed = Url::parse(url).map_err(|e| BlockedUrlError::Unparseable(e.to_string()))?;
        let domain = match parsed.host() {
            Some(Host::Domain(domain)) => domain,
            _ => return Ok(()),
        };
        let host_name = normalize_host(domain);

        if self.policy.is_allowed_host(&host_name) {
            return Ok(());
        }

        let port = parsed.port_or_known_default().unwrap_or(80);
        let lookup = tokio::net::lookup_host((domain, port));
        let addrs: Vec<IpAddr> = match tokio::time::timeout(RESOLVE_TIMEOUT, lookup).await {
            Ok(Ok(resolved)) => resolved.map(|addr| addr.ip()).collect(),
            Ok(Err(e)) => {
                debug!("DNS lookup for {} failed: {}", domain, e);
                return Ok(());
            }
            Err(_) => {
                debug!("DNS lookup for {} timed out", domain);
                return Ok(());
            }
        };

        match addrs.into_iter().find(|ip| self.policy.is_blocked_addr(*ip)) {
            Some(addr) => Err(BlockedUrlError::ResolvesToPrivate {
                host: host_name,
                addr,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_loopback_hosts() {
        let guard = UrlGuard::default();
        assert!(!guard.is_valid("http://localhost/"));
        assert!(!guard.is_valid("http://LOCALHOST:3000/admin"));
        assert!(!guard.is_valid("http://127.0.0.1/"));
        assert!(!guard.is_valid("http://0.0.0.0:8080/"));
        assert!(!guard.is_valid("http://[::1]/"));
    }

    #[test]
    fn test_blocks_private_ranges() {
        let guard = UrlGuard::default();
        assert!(!guard.is_valid("http://10.0.0.1/"));
        assert!(!guard.is_valid("https://10.255.3.4/jobs"));
        assert!(!guard.is_valid("http://172.16.0.1/"));
        assert!(!guard.is_valid("http://172.31.255.255/"));
        assert!(!guard.is_valid("http://192.168.1.1/"));
        assert!(!guard.is_valid("http://169.254.169.254/latest/meta-data"));
        assert!(!guard.is_valid("http://[fc00::1]/"));
        assert!(!guard.is_valid("http://[fd12:3456::1]/"));
        assert!(!guard.is_valid("http://[fe80::1]/"));
    }

    #[test]
    fn test_private_range_boundaries() {
        let guard = UrlGuard::default();
        assert!(guard.is_valid("http://172.15.0.1/"));
        assert!(guard.is_valid("http://172.32.0.1/"));
        assert!(guard.is_valid("http://11.0.0.1/"));
        assert!(guard.is_valid("http://192.169.0.1/"));
    }

    #[test]
    fn test_blocks_non_web_schemes() {
        let guard = UrlGuard::default();
        assert_eq!(
            guard.check("ftp://example.com/file"),
            Err(BlockedUrlError::DisallowedScheme("ftp".to_string()))
        );
        assert!(!guard.is_valid("file:///etc/passwd"));
        assert!(!guard.is_valid("javascript:alert(1)"));
        assert!(!guard.is_valid("gopher://example.com/"));
    }

    #[test]
    fn test_rejects_unparseable() {
        let guard = UrlGuard::default();
        assert!(matches!(
            guard.check("not a url"),
            Err(BlockedUrlError::Unparseable(_))
        ));
        assert!(!guard.is_valid("/relative/path"));
        assert!(!guard.is_valid(""));
    }

    #[test]
    fn test_allows_public_urls() {
        let guard = UrlGuard::default();
        assert!(guard.is_valid("https://example.com/"));
        assert!(guard.is_valid("http://jobs.example.org/posting/123?ref=abc"));
        assert!(guard.is_valid("https://boards.greenhouse.io/acme/jobs/42"));
        assert!(guard.is_valid("https://93.184.216.34/"));
    }

    #[test]
    fn test_reports_reason() {
        let guard = UrlGuard::default();
        assert_eq!(
            guard.check("http://localhost/"),
            Err(BlockedUrlError::BlockedHost("localhost".to_string()))
        );
        assert_eq!(
            guard.check("http://192.168.0.10/"),
            Err(BlockedUrlError::PrivateRange("192.168.0.10".to_string()))
        );
    }

    #[test]
    fn test_allow_host_bypasses_deny_rules() {
        let guard = UrlGuard::new(UrlPolicy::default().allow_host("127.0.0.1"));
        assert!(guard.is_valid("http://127.0.0.1:4321/job"));
        assert!(!guard.is_valid("http://localhost:4321/job"));
        assert!(!guard.is_valid("ftp://127.0.0.1/"));
    }

    #[test]
    fn test_block_host_extends_denylist() {
        let guard = UrlGuard::new(UrlPolicy::default().block_host("metadata.google.internal"));
        assert!(!guard.is_valid("http://metadata.google.internal/computeMetadata"));
    }

    #[tokio::test]
    async fn test_resolved_check_catches_mapped_loopback() {
        let guard = UrlGuard::default();
        // Passes the textual patterns but is loopback once decoded
        assert!(guard.is_valid("http://[::ffff:127.0.0.1]/"));
        assert!(matches!(
            guard.check_resolved("http://[::ffff:127.0.0.1]/").await,
            Err(BlockedUrlError::ResolvesToPrivate { .. })
        ));
    }

    #[test]
    fn test_literal_check() {
        let guard = UrlGuard::default();
        assert!(matches!(
            guard.check_literal("http://[::ffff:7f00:1]:8080/internal"),
            Err(BlockedUrlError::ResolvesToPrivate { .. })
        ));
        assert!(guard.check_literal("http://[::ffff:5db8:d822]/").is_ok());
        assert!(guard.check_literal("https://jobs.example.com/").is_ok());

        let allowed = UrlGuard::new(UrlPolicy::default().allow_host("::ffff:7f00:1"));
        assert!(allowed.check_literal("http://[::ffff:7f00:1]/").is_ok());
    }

    #[test]
    fn test_resolve_timeout_matches_fetch_budget() {
        assert_eq!(RESOLVE_TIMEOUT, crate::job_import::job_scraper::FETCH_TIMEOUT);
    }

    #[tokio::test]
    async fn test_resolved_check_passes_public_literal() {
        let guard = UrlGuard::default();
        assert!(guard.check_resolved("https://93.184.216.34/").await.is_ok());
    }

    #[tokio::test]
    async fn test_resolved_check_respects_allowed_hosts() {
        let guard = UrlGuard::new(UrlPolicy::default().allow_host("127.0.0.1"));
        assert!(guard.check_resolved("http://127.0.0.1:9/").await.is_ok());
    }
}
