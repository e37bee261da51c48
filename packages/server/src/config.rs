use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Every six hours, on the hour (seconds-first cron syntax)
pub const DEFAULT_SYNC_CRON_PATTERN: &str = "0 0 */6 * * *";

pub const DEFAULT_REGISTRY_BASE_URL: &str = "https://api.wegwijs.vlaanderen.be/v1";

pub const DEFAULT_RESOURCE_BASE_URI: &str = "http://data.lblod.info/id/";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub registry_base_url: String,
    /// Comma-separated field list for registry queries; client default when unset
    pub registry_fields: Option<String>,
    pub registry_timeout_secs: u64,
    pub sync_cron_pattern: String,
    pub run_sweep_on_startup: bool,
    /// Prefix for URIs minted by this service
    pub resource_base_uri: String,
    pub db_max_connections: u32,
    /// Server-side limit for a single query
    pub db_statement_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            registry_base_url: env::var("REGISTRY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_REGISTRY_BASE_URL.to_string()),
            registry_fields: env::var("REGISTRY_FIELDS").ok().filter(|f| !f.is_empty()),
            registry_timeout_secs: env::var("REGISTRY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("REGISTRY_TIMEOUT_SECS must be a valid number")?,
            sync_cron_pattern: env::var("SYNC_CRON_PATTERN")
                .unwrap_or_else(|_| DEFAULT_SYNC_CRON_PATTERN.to_string()),
            run_sweep_on_startup: env::var("RUN_SWEEP_ON_STARTUP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            resource_base_uri: env::var("RESOURCE_BASE_URI")
                .unwrap_or_else(|_| DEFAULT_RESOURCE_BASE_URI.to_string()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            db_statement_timeout_secs: env::var("DB_STATEMENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("DB_STATEMENT_TIMEOUT_SECS must be a valid number")?,
        })
    }
}
