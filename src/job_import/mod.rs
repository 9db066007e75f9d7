// src/job_import/mod.rs
use serde::{Deserialize, Serialize};

pub mod error;
pub mod job_scraper;
pub mod resolver;
pub mod sanitize;
pub mod sources;
pub mod url_guard;

pub use error::{BlockedUrlError, FetchError, ImportError};
pub use job_scraper::{parse_job_page, JobScraper};
pub use resolver::GuardedResolver;
pub use sanitize::{extract_domain, sanitize_text};
pub use url_guard::{UrlGuard, UrlPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub url: String,
}

/// Fields extracted from a job posting page. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedJobData {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub source_domain: String,
}
