// src/job_import/error.rs
//! Typed failures for job posting import.
//!
//! Only two things stop an import: the URL guard refusing the target, or the
//! fetch itself failing. Missing or malformed page metadata never does.

use std::error::Error as StdError;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("URL blocked: {0}")]
    BlockedUrl(#[from] BlockedUrlError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

impl ImportError {
    /// Stable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::BlockedUrl(_) => "BLOCKED_URL",
            ImportError::Fetch(_) => "FETCH_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ImportError::Fetch(_))
    }
}

/// Reasons the URL guard refuses a target before any network access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockedUrlError {
    #[error("not an absolute URL: {0}")]
    Unparseable(String),

    #[error("scheme '{0}' is not allowed")]
    DisallowedScheme(String),

    #[error("URL has no host")]
    NoHost,

    #[error("host '{0}' is blocked")]
    BlockedHost(String),

    #[error("host '{0}' is in a private address range")]
    PrivateRange(String),

    #[error("host '{host}' resolves to private address {addr}")]
    ResolvesToPrivate { host: String, addr: IpAddr },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("target responded with HTTP {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ImportError {
    fn from(e: reqwest::Error) -> Self {
        // Redirect hops and the connect-time resolver carry the guard's verdict
        if let Some(blocked) = blocked_cause(&e) {
            return ImportError::BlockedUrl(blocked);
        }

        if e.is_timeout() {
            return ImportError::Fetch(FetchError::Timeout);
        }

        match e.status() {
            Some(status) => ImportError::Fetch(FetchError::Status(status.as_u16())),
            None => ImportError::Fetch(FetchError::Network(e.to_string())),
        }
    }
}

/// First `BlockedUrlError` anywhere in the source chain.
fn blocked_cause(e: &(dyn StdError + 'static)) -> Option<BlockedUrlError> {
    let mut cause = e.source();
    while let Some(err) = cause {
        if let Some(blocked) = err.downcast_ref::<BlockedUrlError>() {
            return Some(blocked.clone());
        }
        // io::Error hides its payload from source()
        if let Some(blocked) = err
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<BlockedUrlError>())
        {
            return Some(blocked.clone());
        }
        cause = err.source();
    }
    None
}
