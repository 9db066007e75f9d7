// src/web/handlers/system_handlers.rs
use crate::database::DatabaseConfig;
use crate::web::types::{ApiError, StandardErrorResponse, TextResponse};

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

pub async fn health_handler(
    db_config: &State<DatabaseConfig>,
) -> Result<Json<TextResponse>, ApiError> {
    let probe = match db_config.pool() {
        Ok(pool) => sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    if let Err(e) = probe {
        error!("Database health check failed: {}", e);
        return Err(StandardErrorResponse::new(
            "Database unavailable".to_string(),
            "DATABASE_UNAVAILABLE".to_string(),
            vec!["Try again in a few moments".to_string()],
        )
        .with_status(Status::ServiceUnavailable));
    }

    info!("Health check OK");
    Ok(Json(TextResponse::success("OK (database: ok)".to_string())))
}
