// src/job_import/sources.rs
//! Field sources for job posting pages.
//!
//! Each output field is resolved from an ordered list of sources; the first
//! one yielding non-empty text wins. JSON-LD `JobPosting` data is applied
//! afterwards as an override pass.

use super::sanitize::sanitize_text;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaSource {
    OgTitle,
    PageTitle,
    OgSiteName,
    OgDescription,
    MetaDescription,
}

pub const TITLE_SOURCES: &[MetaSource] = &[MetaSource::OgTitle, MetaSource::PageTitle];
pub const COMPANY_SOURCES: &[MetaSource] = &[MetaSource::OgSiteName];
pub const DESCRIPTION_SOURCES: &[MetaSource] =
    &[MetaSource::OgDescription, MetaSource::MetaDescription];

impl MetaSource {
    fn selector(&self) -> &'static str {
        match self {
            MetaSource::OgTitle => r#"meta[property="og:title"]"#,
            MetaSource::PageTitle => "title",
            MetaSource::OgSiteName => r#"meta[property="og:site_name"]"#,
            MetaSource::OgDescription => r#"meta[property="og:description"]"#,
            MetaSource::MetaDescription => r#"meta[name="description"]"#,
        }
    }

    /// Raw text of the first matching element, if any.
    pub fn read(&self, document: &Html) -> Option<String> {
        let selector = Selector::parse(self.selector()).ok()?;
        let element = document.select(&selector).next()?;

        match self {
            MetaSource::PageTitle => Some(element.text().collect()),
            _ => element.value().attr("content").map(str::to_string),
        }
    }
}

/// First source whose sanitized value is non-empty.
pub fn first_match(document: &Html, sources: &[MetaSource]) -> Option<String> {
    sources
        .iter()
        .filter_map(|source| source.read(document))
        .map(|raw| sanitize_text(&raw))
        .find(|value| !value.is_empty())
}

/// First non-empty path segment, e.g. `acme` for `https://jobs.example.com/acme/123`.
pub fn path_company_hint(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.find(|s| !s.is_empty())?;
    Some(sanitize_text(segment)).filter(|s| !s.is_empty())
}

/// Candidate values for each output field before fallbacks are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFields {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl JobFields {
    pub fn from_meta(document: &Html) -> Self {
        Self {
            job_title: first_match(document, TITLE_SOURCES),
            company: first_match(document, COMPANY_SOURCES),
            location: None,
            description: first_match(document, DESCRIPTION_SOURCES),
        }
    }

    /// Structured data is authoritative for every field it supplies.
    pub fn apply_structured(&mut self, posting: StructuredJobPosting) {
        let StructuredJobPosting {
            title,
            company,
            location,
            description,
        } = posting;

        if title.is_some() {
            self.job_title = title;
        }
        if company.is_some() {
            self.company = company;
        }
        if location.is_some() {
            self.location = location;
        }
        if description.is_some() {
            self.description = description;
        }
    }
}

/// The subset of a schema.org `JobPosting` the importer cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredJobPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl StructuredJobPosting {
    /// Reads the first `application/ld+json` block. Absent, malformed, or
    /// non-`JobPosting` data yields `None`.
    pub fn from_document(document: &Html) -> Option<Self> {
        let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
        let script = document.select(&selector).next()?;
        let raw: String = script.text().collect();

        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => Self::from_json(&value),
            Err(e) => {
                warn!("Ignoring malformed JSON-LD block: {}", e);
                None
            }
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        if value.get("@type").and_then(Value::as_str) != Some("JobPosting") {
            return None;
        }

        // jobLocation may be a single Place or a list of them
        let place = match value.get("jobLocation") {
            Some(Value::Array(places)) => places.first(),
            other => other,
        };
        let address = place.and_then(|p| p.get("address"));

        Some(Self {
            title: text_field(value.get("title")),
            company: text_field(
                value
                    .get("hiringOrganization")
                    .and_then(|org| org.get("name")),
            ),
            location: text_field(address.and_then(|a| a.get("addressLocality")))
                .or_else(|| text_field(address.and_then(|a| a.get("addressRegion")))),
            description: text_field(value.get("description")),
        })
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(sanitize_text)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_title_prefers_open_graph() {
        let doc = Html::parse_document(
            r#"<html><head><title>Page Title</title>
            <meta property="og:title" content="OG Title"></head></html>"#,
        );
        assert_eq!(first_match(&doc, TITLE_SOURCES), Some("OG Title".to_string()));
    }

    #[test]
    fn test_title_falls_back_to_page_title() {
        let doc = Html::parse_document("<html><head><title> Widget Engineer </title></head></html>");
        assert_eq!(
            first_match(&doc, TITLE_SOURCES),
            Some("Widget Engineer".to_string())
        );
    }

    #[test]
    fn test_empty_source_falls_through() {
        let doc = Html::parse_document(
            r#"<head><meta property="og:description" content="   ">
            <meta name="description" content="Generic description"></head>"#,
        );
        assert_eq!(
            first_match(&doc, DESCRIPTION_SOURCES),
            Some("Generic description".to_string())
        );
    }

    #[test]
    fn test_missing_sources_yield_none() {
        let doc = Html::parse_document("<p>nothing here</p>");
        assert_eq!(first_match(&doc, COMPANY_SOURCES), None);
        assert_eq!(first_match(&doc, DESCRIPTION_SOURCES), None);
    }

    #[test]
    fn test_path_company_hint() {
        assert_eq!(
            path_company_hint("https://boards.example.com/acme/jobs/1"),
            Some("acme".to_string())
        );
        assert_eq!(
            path_company_hint("https://example.com//globex/"),
            Some("globex".to_string())
        );
        assert_eq!(path_company_hint("https://example.com/"), None);
        assert_eq!(path_company_hint("not a url"), None);
    }

    #[test]
    fn test_structured_posting_fields() {
        let posting = StructuredJobPosting::from_json(&json!({
            "@context": "https://schema.org",
            "@type": "JobPosting",
            "title": "Platform Engineer",
            "hiringOrganization": { "@type": "Organization", "name": "Initech" },
            "jobLocation": { "address": { "addressLocality": "Austin", "addressRegion": "TX" } },
            "description": "Keep the lights on"
        }))
        .unwrap();

        assert_eq!(posting.title.as_deref(), Some("Platform Engineer"));
        assert_eq!(posting.company.as_deref(), Some("Initech"));
        assert_eq!(posting.location.as_deref(), Some("Austin"));
        assert_eq!(posting.description.as_deref(), Some("Keep the lights on"));
    }

    #[test]
    fn test_structured_location_falls_back_to_region() {
        let posting = StructuredJobPosting::from_json(&json!({
            "@type": "JobPosting",
            "jobLocation": [{ "address": { "addressRegion": "Bavaria" } }]
        }))
        .unwrap();

        assert_eq!(posting.location.as_deref(), Some("Bavaria"));
        assert_eq!(posting.title, None);
    }

    #[test]
    fn test_structured_other_types_ignored() {
        assert_eq!(
            StructuredJobPosting::from_json(&json!({ "@type": "Organization", "name": "x" })),
            None
        );
        assert_eq!(StructuredJobPosting::from_json(&json!([1, 2, 3])), None);
    }

    #[test]
    fn test_malformed_json_ld_ignored() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">{ "@type": "JobPosting", </script>"#,
        );
        assert_eq!(StructuredJobPosting::from_document(&doc), None);
    }

    #[test]
    fn test_apply_structured_is_non_destructive() {
        let mut fields = JobFields {
            job_title: Some("OG Title".to_string()),
            company: Some("OG Site".to_string()),
            location: None,
            description: Some("OG Description".to_string()),
        };
        fields.apply_structured(StructuredJobPosting {
            title: Some("LD Title".to_string()),
            company: None,
            location: Some("Berlin".to_string()),
            description: None,
        });

        assert_eq!(fields.job_title.as_deref(), Some("LD Title"));
        assert_eq!(fields.company.as_deref(), Some("OG Site"));
        assert_eq!(fields.location.as_deref(), Some("Berlin"));
        assert_eq!(fields.description.as_deref(), Some("OG Description"));
    }
}
