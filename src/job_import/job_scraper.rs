// src/job_import/job_scraper.rs
use super::error::{FetchError, ImportError};
use super::resolver::GuardedResolver;
use super::sanitize::{extract_domain, truncate_chars};
use super::sources::{path_company_hint, JobFields, StructuredJobPosting};
use super::url_guard::UrlGuard;
use super::ParsedJobData;
use anyhow::{Context, Result};
use reqwest::{redirect, Client, Response};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; JobTrackerBot/1.0)";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const UNKNOWN_POSITION: &str = "Unknown Position";
pub const UNKNOWN_LOCATION: &str = "Not specified";
/// Bytes of a page read before the rest is discarded.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const MAX_REDIRECTS: usize = 5;

pub struct JobScraper {
    client: Client,
    guard: UrlGuard,
    timeout: Duration,
    check_resolved: bool,
}

impl JobScraper {
    pub fn new(guard: UrlGuard) -> Result<Self> {
        Self::build(guard, FETCH_TIMEOUT, None)
    }

    /// Also refuse targets whose addresses fall in private ranges.
    ///
    /// Domain names are checked by the client's resolver when each
    /// connection opens, redirects included; IP literals are checked before
    /// the request and on every redirect hop.
    pub fn with_resolved_address_check(self, enabled: bool) -> Result<Self> {
        let resolver = enabled.then(|| GuardedResolver::new(self.guard.policy()));
        Self::build(self.guard, self.timeout, resolver)
    }

    fn build(
        guard: UrlGuard,
        timeout: Duration,
        resolver: Option<GuardedResolver>,
    ) -> Result<Self> {
        let check_resolved = resolver.is_some();
        let redirect_guard = guard.clone();

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(redirect::Policy::custom(move |attempt| {
                // previous() holds the original URL plus every hop so far
                if attempt.previous().len() > MAX_REDIRECTS {
                    return attempt.error("too many redirects");
                }
                let target = attempt.url().as_str();
                let verdict = redirect_guard.check(target).and_then(|()| {
                    if check_resolved {
                        redirect_guard.check_literal(target)
                    } else {
                        Ok(())
                    }
                });
                match verdict {
                    Ok(()) => attempt.follow(),
                    Err(blocked) => attempt.error(blocked),
                }
            }));

        if let Some(resolver) = resolver {
            builder = builder.dns_resolver(Arc::new(resolver));
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            guard,
            timeout,
            check_resolved,
        })
    }

    pub fn guard(&self) -> &UrlGuard {
        &self.guard
    }

    /// Guard, fetch and parse a job posting page.
    ///
    /// Dropping the returned future cancels the in-flight request.
    pub async fn extract_job_data(&self, url: &str) -> Result<ParsedJobData, ImportError> {
        let verdict = self.guard.check(url).and_then(|()| {
            if self.check_resolved {
                self.guard.check_literal(url)
            } else {
                Ok(())
            }
        });
        if let Err(blocked) = verdict {
            warn!("Refusing to fetch {}: {}", url, blocked);
            return Err(blocked.into());
        }

        info!("Fetching job post: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            let err = ImportError::from(e);
            warn!("Fetch of {} failed: {}", url, err);
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Fetch of {} returned HTTP {}", url, status);
            return Err(FetchError::Status(status.as_u16()).into());
        }

        let html = read_body(response, MAX_BODY_BYTES).await?;
        let data = parse_job_page(url, &html);

        info!(
            "Successfully extracted job: {} at {}",
            data.job_title, data.company
        );
        Ok(data)
    }
}

/// Read at most `limit` bytes of the body, decoding it as UTF-8 leniently.
async fn read_body(mut response: Response, limit: usize) -> Result<String, ImportError> {
    let mut body: Vec<u8> = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= limit {
            warn!(
                "Response from {} exceeds {} bytes, ignoring the rest",
                response.url(),
                limit
            );
            break;
        }
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Resolve every field of a fetched page. Never fails: each missing source
/// degrades its field to the next fallback.
pub fn parse_job_page(url: &str, html: &str) -> ParsedJobData {
    let document = Html::parse_document(html);
    let mut fields = JobFields::from_meta(&document);

    if let Some(posting) = StructuredJobPosting::from_document(&document) {
        fields.apply_structured(posting);
    }

    if fields.company.is_none() {
        fields.company = path_company_hint(url);
    }

    let source_domain = extract_domain(url);
    let description = fields
        .description
        .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS))
        .unwrap_or_default();

    ParsedJobData {
        job_title: fields
            .job_title
            .unwrap_or_else(|| UNKNOWN_POSITION.to_string()),
        company: fields.company.unwrap_or_else(|| source_domain.clone()),
        location: fields
            .location
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        description,
        source_domain,
    }
}
