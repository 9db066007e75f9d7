// src/config.rs
use crate::job_import::{UrlGuard, UrlPolicy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(skip)]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Also reject hosts whose DNS answers fall in private ranges
    #[serde(default = "default_true")]
    pub check_resolved_addresses: bool,
    /// Hosts admitted even though the deny rules match them
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            check_resolved_addresses: true,
            allowed_hosts: Vec::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            import: ImportConfig::default(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: Option<AppConfig>,
    production: Option<AppConfig>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/job_tracker.db")
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load configuration for the current environment.
    ///
    /// Reads `config.yaml` when present; otherwise built-in defaults apply.
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = PathBuf::from(CONFIG_FILE);
        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path, &environment)?
        } else {
            info!("{} not found, using defaults", CONFIG_FILE);
            Self::default()
        };

        config.database_path = Self::resolve_path(&config.database_path)?;
        config.port = Self::get_port()?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("JOB_TRACKER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn get_port() -> Result<u16> {
        match std::env::var("ROCKET_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number")),
            Err(_) => Ok(DEFAULT_PORT),
        }
    }

    fn load_from_file(path: &Path, environment: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content, environment)
    }

    fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse config.yaml")?;

        let section = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(section.unwrap_or_default())
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Guard built from the configured policy, shared by all handlers.
    pub fn url_guard(&self) -> UrlGuard {
        let policy = self
            .import
            .allowed_hosts
            .iter()
            .fold(UrlPolicy::default(), |policy, host| policy.allow_host(host.as_str()));
        UrlGuard::new(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
local:
  database_path: local.db
  import:
    check_resolved_addresses: false
    allowed_hosts: ["127.0.0.1"]
production:
  database_path: /var/lib/job-tracker/jobs.db
"#;

    #[test]
    fn test_selects_environment_section() {
        let local = AppConfig::from_yaml(SAMPLE, "local").unwrap();
        assert_eq!(local.database_path, PathBuf::from("local.db"));
        assert!(!local.import.check_resolved_addresses);
        assert_eq!(local.import.allowed_hosts, vec!["127.0.0.1".to_string()]);

        let production = AppConfig::from_yaml(SAMPLE, "production").unwrap();
        assert_eq!(
            production.database_path,
            PathBuf::from("/var/lib/job-tracker/jobs.db")
        );
        assert!(production.import.check_resolved_addresses);
        assert!(production.import.allowed_hosts.is_empty());
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config = AppConfig::from_yaml("local:\n  database_path: x.db\n", "production").unwrap();
        assert_eq!(config.database_path, default_database_path());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(AppConfig::from_yaml("local: [unclosed", "local").is_err());
    }

    #[test]
    fn test_url_guard_honours_allowed_hosts() {
        let config = AppConfig::from_yaml(SAMPLE, "local").unwrap();
        let guard = config.url_guard();
        assert!(guard.is_valid("http://127.0.0.1:8080/"));
        assert!(!AppConfig::default().url_guard().is_valid("http://127.0.0.1:8080/"));
    }
}
