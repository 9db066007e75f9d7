use anyhow::Result;
use clap::Parser;
use job_tracker::cli::{handle_command, Cli};
use job_tracker::AppConfig;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "job_tracker=info,rocket::server=off";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging first
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    info!("Database: {}", config.database_path.display());

    handle_command(cli, config).await
}
