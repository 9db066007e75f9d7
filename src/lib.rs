pub mod cli;
pub mod config;
pub mod database;
pub mod job_import;
pub mod jobs;
pub mod session;
pub mod web;

pub use config::AppConfig;
pub use job_import::{ImportError, JobScraper, ParsedJobData, UrlGuard};
pub use web::start_web_server;
