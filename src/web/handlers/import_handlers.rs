// src/web/handlers/import_handlers.rs
use crate::job_import::{ImportError, ImportRequest, ParsedJobData};
use crate::session::SessionUser;
use crate::web::types::{ApiError, DataResponse, ServerConfig, StandardErrorResponse};

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

pub async fn import_job_handler(
    request: Json<ImportRequest>,
    user: SessionUser,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<ParsedJobData>>, ApiError> {
    let url = request.into_inner().url;
    info!("User {} importing job posting from {}", user.id(), url);

    match config.scraper.extract_job_data(&url).await {
        Ok(extracted) => Ok(Json(DataResponse::success(
            format!("Extracted job details from {}", extracted.source_domain),
            extracted,
        ))),
        Err(e) => {
            let (status, message, suggestions) = describe_import_error(&e);
            match &e {
                ImportError::BlockedUrl(_) => warn!("Import of {} refused: {}", url, e),
                ImportError::Fetch(_) => error!("Import of {} failed: {}", url, e),
            }
            Err(
                StandardErrorResponse::new(message, e.code().to_string(), suggestions)
                    .with_status(status),
            )
        }
    }
}

fn describe_import_error(e: &ImportError) -> (Status, String, Vec<String>) {
    match e {
        ImportError::BlockedUrl(reason) => (
            Status::BadRequest,
            format!("Invalid URL or blocked for security reasons: {}", reason),
            vec![
                "Use a public http:// or https:// job posting URL".to_string(),
                "Internal and private network addresses are not allowed".to_string(),
            ],
        ),
        ImportError::Fetch(reason) => (
            Status::BadGateway,
            format!("Failed to fetch job posting: {}", reason),
            vec![
                "Verify the job posting URL is accessible".to_string(),
                "The posting may be behind authentication or no longer available".to_string(),
                "Try again in a few moments".to_string(),
            ],
        ),
    }
}
