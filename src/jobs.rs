// src/jobs.rs
use crate::job_import::{BlockedUrlError, UrlGuard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum JobStatus {
    #[default]
    Saved,
    Applied,
    Interviewing,
    Offer,
    Rejected,
    Ghosted,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Saved => "SAVED",
            JobStatus::Applied => "APPLIED",
            JobStatus::Interviewing => "INTERVIEWING",
            JobStatus::Offer => "OFFER",
            JobStatus::Rejected => "REJECTED",
            JobStatus::Ghosted => "GHOSTED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SAVED" => Ok(JobStatus::Saved),
            "APPLIED" => Ok(JobStatus::Applied),
            "INTERVIEWING" => Ok(JobStatus::Interviewing),
            "OFFER" => Ok(JobStatus::Offer),
            "REJECTED" => Ok(JobStatus::Rejected),
            "GHOSTED" => Ok(JobStatus::Ghosted),
            other => Err(format!("Unknown job status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub job_title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: JobStatus,
    pub applied_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub source_domain: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the append-only status audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: String,
    pub job_id: String,
    pub from_status: Option<JobStatus>,
    pub to_status: JobStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobWithHistory {
    #[serde(flatten)]
    pub job: Job,
    /// Newest first
    pub status_history: Vec<StatusChange>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub url: String,
    pub job_title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<JobStatus>,
    pub applied_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Error)]
pub enum JobValidationError {
    #[error("Invalid URL or blocked for security reasons: {0}")]
    BlockedUrl(#[from] BlockedUrlError),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

impl NewJob {
    pub fn validate(&self, guard: &UrlGuard) -> Result<(), JobValidationError> {
        guard.check(&self.url)?;

        if self.job_title.trim().is_empty() {
            return Err(JobValidationError::EmptyField("jobTitle"));
        }
        if self.company.trim().is_empty() {
            return Err(JobValidationError::EmptyField("company"));
        }

        Ok(())
    }
}

/// Partial update. `appliedDate` and `notes` distinguish an absent key
/// (leave as is) from an explicit `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub applied_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub notes: Option<Option<String>>,
}

impl JobUpdate {
    /// Apply the patch, returning the previous status if it changed.
    pub fn apply_to(self, job: &mut Job) -> Option<JobStatus> {
        if let Some(title) = self.job_title {
            job.job_title = title;
        }
        if let Some(company) = self.company {
            job.company = company;
        }
        if let Some(location) = self.location {
            job.location = Some(location);
        }
        if let Some(description) = self.description {
            job.description = Some(description);
        }
        if let Some(applied_date) = self.applied_date {
            job.applied_date = applied_date;
        }
        if let Some(notes) = self.notes {
            job.notes = notes;
        }

        match self.status {
            Some(status) if status != job.status => {
                let previous = job.status;
                job.status = status;
                Some(previous)
            }
            _ => None,
        }
    }
}

fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}
