// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use crate::config::AppConfig;
use crate::database::DatabaseConfig;
use crate::job_import::{ImportRequest, JobScraper, ParsedJobData};
use crate::jobs::{Job, JobUpdate, JobWithHistory, NewJob};
use crate::session::{SessionError, SessionUser};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, patch, post, routes, Build, Request, Response, Rocket, State};
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[post("/import", data = "<request>")]
pub async fn import_job(
    request: Json<ImportRequest>,
    user: SessionUser,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<ParsedJobData>>, ApiError> {
    handlers::import_job_handler(request, user, config).await
}

#[get("/jobs?<status>&<search>")]
pub async fn list_jobs(
    status: Option<String>,
    search: Option<String>,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DataResponse<Vec<JobWithHistory>>>, ApiError> {
    handlers::list_jobs_handler(status, search, user, db_config).await
}

#[post("/jobs", data = "<request>")]
pub async fn create_job(
    request: Json<NewJob>,
    user: SessionUser,
    config: &State<ServerConfig>,
    db_config: &State<DatabaseConfig>,
) -> Result<(Status, Json<DataResponse<Job>>), ApiError> {
    handlers::create_job_handler(request, user, config, db_config).await
}

#[get("/jobs/<id>")]
pub async fn get_job(
    id: &str,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DataResponse<JobWithHistory>>, ApiError> {
    handlers::get_job_handler(id, user, db_config).await
}

#[patch("/jobs/<id>", data = "<request>")]
pub async fn update_job(
    id: &str,
    request: Json<JobUpdate>,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<DataResponse<JobWithHistory>>, ApiError> {
    handlers::update_job_handler(id, request, user, db_config).await
}

#[delete("/jobs/<id>")]
pub async fn delete_job(
    id: &str,
    user: SessionUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::delete_job_handler(id, user, db_config).await
}

#[get("/health")]
pub async fn health(db_config: &State<DatabaseConfig>) -> Result<Json<TextResponse>, ApiError> {
    handlers::health_handler(db_config).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        SessionError::MissingUser.message().to_string(),
        "UNAUTHORIZED".to_string(),
        vec!["Sign in and try again".to_string()],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the request path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid input".to_string(),
        "INVALID_INPUT".to_string(),
        vec![
            "Check field names and value types".to_string(),
            "Status must be one of SAVED, APPLIED, INTERVIEWING, OFFER, REJECTED, GHOSTED"
                .to_string(),
        ],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

/// Assemble the application without launching it.
pub fn build_rocket(
    figment: Figment,
    server_config: ServerConfig,
    db_config: DatabaseConfig,
) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .manage(server_config)
        .manage(db_config)
        .register(
            "/api",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                import_job,
                list_jobs,
                create_job,
                get_job,
                update_job,
                delete_job,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    let mut db_config = DatabaseConfig::new(config.database_path.clone());

    if let Err(e) = db_config.init_pool().await {
        error!("Failed to initialize database: {}", e);
        return Err(e);
    }

    if let Err(e) = db_config.migrate().await {
        error!("Failed to run database migrations: {}", e);
        return Err(e);
    }

    let scraper = JobScraper::new(config.url_guard())?
        .with_resolved_address_check(config.import.check_resolved_addresses)?;

    info!("Starting job tracker API server");
    info!("Database: {}", db_config.database_path.display());
    info!("Server: http://0.0.0.0:{}", config.port);

    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", config.port));

    build_rocket(figment, ServerConfig { scraper }, db_config)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed: {}", e))?;

    Ok(())
}
