// src/cli.rs
use crate::config::AppConfig;
use crate::job_import::JobScraper;
use crate::web::start_web_server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "job-tracker")]
#[command(about = "Track job applications and import postings from their URLs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Fetch a job posting and print the extracted fields as JSON
    Import { url: String },
    /// Report whether a URL would be accepted for import
    CheckUrl { url: String },
}

pub async fn handle_command(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => start_web_server(config).await,

        Command::Import { url } => {
            let scraper = JobScraper::new(config.url_guard())?
                .with_resolved_address_check(config.import.check_resolved_addresses)?;
            let parsed = scraper.extract_job_data(&url).await?;
            let json = serde_json::to_string_pretty(&parsed)
                .context("Failed to serialize extracted job data")?;
            println!("{}", json);
            Ok(())
        }

        Command::CheckUrl { url } => {
            let guard = config.url_guard();
            let verdict = if config.import.check_resolved_addresses {
                guard.check_resolved(&url).await
            } else {
                guard.check(&url)
            };

            match verdict {
                Ok(()) => {
                    info!("{} is allowed", url);
                    println!("allowed: {}", url);
                    Ok(())
                }
                Err(reason) => {
                    warn!("{} is blocked: {}", url, reason);
                    anyhow::bail!("blocked: {}", reason)
                }
            }
        }
    }
}
