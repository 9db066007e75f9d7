// src/job_import/resolver.rs
//! DNS resolution for the fetch client that refuses private addresses.
//!
//! reqwest calls this when it opens a connection, so the addresses checked
//! are the addresses connected to, and the lookup runs inside the request
//! timeout. IP-literal hosts never reach a resolver; the redirect policy
//! covers those with [`UrlGuard::check_literal`](super::UrlGuard::check_literal).

use super::error::BlockedUrlError;
use super::url_guard::UrlPolicy;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type LookupFuture = Pin<Box<dyn Future<Output = io::Result<Vec<SocketAddr>>> + Send>>;
type Lookup = Arc<dyn Fn(String) -> LookupFuture + Send + Sync>;

#[derive(Clone)]
pub struct GuardedResolver {
    policy: Arc<UrlPolicy>,
    lookup: Lookup,
}

impl GuardedResolver {
    /// Resolver backed by the system's `getaddrinfo`.
    pub fn new(policy: Arc<UrlPolicy>) -> Self {
        Self::with_lookup(
            policy,
            Arc::new(|host: String| -> LookupFuture {
                Box::pin(async move {
                    let addrs = tokio::net::lookup_host((host.as_str(), 0)).await?;
                    Ok::<_, io::Error>(addrs.collect::<Vec<SocketAddr>>())
                })
            }),
        )
    }

    fn with_lookup(policy: Arc<UrlPolicy>, lookup: Lookup) -> Self {
        Self { policy, lookup }
    }

    /// Addresses of `host` the policy allows connecting to.
    ///
    /// Private answers are dropped; a host with only private answers is
    /// refused outright.
    pub async fn resolve_allowed(&self, host: &str) -> Result<Vec<SocketAddr>, BoxError> {
        let host = host.to_lowercase();
        let addrs = (self.lookup)(host.clone()).await?;

        if self.policy.is_allowed_host(&host) {
            return Ok(addrs);
        }

        let (allowed, blocked): (Vec<SocketAddr>, Vec<SocketAddr>) = addrs
            .into_iter()
            .partition(|addr| !self.policy.is_blocked_addr(addr.ip()));

        match (allowed.is_empty(), blocked.first()) {
            (true, Some(addr)) => {
                warn!("Refusing to connect to {}: resolves to {}", host, addr.ip());
                Err(BlockedUrlError::ResolvesToPrivate {
                    host,
                    addr: addr.ip(),
                }
                .into())
            }
            (false, Some(_)) => {
                warn!(
                    "Dropped {} private address(es) resolved for {}",
                    blocked.len(),
                    host
                );
                Ok(allowed)
            }
            _ => Ok(allowed),
        }
    }
}

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs = resolver.resolve_allowed(&host).await?;
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}
