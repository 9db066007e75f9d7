// src/web/handlers/job_handlers.rs
use crate::database::{DatabaseConfig, JobRepository};
use crate::job_import::extract_domain;
use crate::jobs::{Job, JobFilter, JobStatus, JobUpdate, JobWithHistory, NewJob};
use crate::session::SessionUser;
use crate::web::types::{
    ActionResponse, ApiError, DataResponse, ServerConfig, StandardErrorResponse,
};

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use sqlx::SqlitePool;
use tracing::{error, info};

fn database_error(e: anyhow::Error) -> ApiError {
    error!("Database operation failed: {:#}", e);
    StandardErrorResponse::new(
        "Internal server error".to_string(),
        "DATABASE_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
    )
    .with_status(Status::InternalServerError)
}

fn job_not_found(id: &str) -> ApiError {
    StandardErrorResponse::new(
        format!("Job not found: {}", id),
        "JOB_NOT_FOUND".to_string(),
        vec!["Refresh your job list".to_string()],
    )
    .with_status(Status::NotFound)
}

fn pool(db_config: &DatabaseConfig) -> Result<&SqlitePool, ApiError> {
    db_config.pool().map_err(database_error)
}

/// `None`, empty and `ALL` mean no status filter.
fn parse_status_filter(status: Option<&str>) -> Result<Option<JobStatus>, ApiError> {
    match status.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s.parse::<JobStatus>().map(Some).map_err(|e: String| {
            StandardErrorResponse::new(
                e,
                "INVALID_STATUS".to_string(),
                vec![
                    "Use one of SAVED, APPLIED, INTERVIEWING, OFFER, REJECTED, GHOSTED or ALL"
                        .to_string(),
                ],
            )
            .with_status(Status::BadRequest)
        }),
    }
}

pub async fn list_jobs_handler(
    status: Option<String>,
    search: Option<String>,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DataResponse<Vec<JobWithHistory>>>, ApiError> {
    let filter = JobFilter {
        status: parse_status_filter(status.as_deref())?,
        search,
    };

    let jobs = JobRepository::new(pool(db_config)?)
        .list(user.id(), &filter)
        .await
        .map_err(database_error)?;

    Ok(Json(DataResponse::success(
        format!("Found {} jobs", jobs.len()),
        jobs,
    )))
}

pub async fn create_job_handler(
    request: Json<NewJob>,
    user: SessionUser,
    config: &State<ServerConfig>,
    db_config: &State<DatabaseConfig>,
) -> Result<(Status, Json<DataResponse<Job>>), ApiError> {
    let new_job = request.into_inner();

    if let Err(e) = new_job.validate(config.scraper.guard()) {
        return Err(StandardErrorResponse::new(
            e.to_string(),
            "VALIDATION_ERROR".to_string(),
            vec!["Provide a public job URL, a job title and a company".to_string()],
        )
        .with_status(Status::BadRequest));
    }

    let source_domain = extract_domain(&new_job.url);
    let job = JobRepository::new(pool(db_config)?)
        .create(user.id(), new_job, &source_domain)
        .await
        .map_err(database_error)?;

    info!("User {} saved job {} ({})", user.id(), job.id, job.job_title);
    Ok((
        Status::Created,
        Json(DataResponse::success("Job created".to_string(), job)),
    ))
}

pub async fn get_job_handler(
    id: &str,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DataResponse<JobWithHistory>>, ApiError> {
    let job = JobRepository::new(pool(db_config)?)
        .find(user.id(), id)
        .await
        .map_err(database_error)?
        .ok_or_else(|| job_not_found(id))?;

    Ok(Json(DataResponse::success("Job found".to_string(), job)))
}

pub async fn update_job_handler(
    id: &str,
    request: Json<JobUpdate>,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DataResponse<JobWithHistory>>, ApiError> {
    let job = JobRepository::new(pool(db_config)?)
        .update(user.id(), id, request.into_inner())
        .await
        .map_err(database_error)?
        .ok_or_else(|| job_not_found(id))?;

    Ok(Json(DataResponse::success("Job updated".to_string(), job)))
}

pub async fn delete_job_handler(
    id: &str,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, ApiError> {
    let deleted = JobRepository::new(pool(db_config)?)
        .delete(user.id(), id)
        .await
        .map_err(database_error)?;

    if !deleted {
        return Err(job_not_found(id));
    }

    Ok(Json(ActionResponse::success(
        format!("Deleted job {}", id),
        "delete".to_string(),
    )))
}
