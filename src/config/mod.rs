use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub arrears: ArrearsConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(AppError::Configuration(format!("Invalid LOG_FORMAT: {}", s))),
        }
    }
}

/// Values stamped onto payments recorded against arrears
#[derive(Debug, Clone, Deserialize)]
pub struct ArrearsConfig {
    /// `term_paid_for` on arrears payments
    pub term_label: String,
    /// Prefix of generated payment display ids (`AR-<millis>-<suffix>`)
    pub receipt_prefix: String,
    /// Used when a settlement does not name a method
    pub default_payment_method: String,
}

impl Default for ArrearsConfig {
    fn default() -> Self {
        Self {
            term_label: "Arrears".to_string(),
            receipt_prefix: "AR".to_string(),
            default_payment_method: "Cash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origins of the admin UI; empty means same-origin only
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = ArrearsConfig::default();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: env::var("LOG_FORMAT")
                    .unwrap_or_else(|_| "pretty".to_string())
                    .parse()?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            arrears: ArrearsConfig {
                term_label: env::var("ARREARS_TERM_LABEL").unwrap_or(defaults.term_label),
                receipt_prefix: env::var("ARREARS_RECEIPT_PREFIX")
                    .unwrap_or(defaults.receipt_prefix),
                default_payment_method: env::var("ARREARS_DEFAULT_PAYMENT_METHOD")
                    .unwrap_or(defaults.default_payment_method),
            },
            cors: CorsConfig {
                allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .map(|raw| parse_origins(&raw))
                    .unwrap_or_default(),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;

        if self.server.workers == 0 {
            return Err(AppError::Configuration(
                "SERVER_WORKERS must be greater than 0".to_string(),
            ));
        }

        if self.arrears.term_label.trim().is_empty() {
            return Err(AppError::Configuration(
                "ARREARS_TERM_LABEL cannot be empty".to_string(),
            ));
        }

        if self.arrears.receipt_prefix.trim().is_empty() {
            return Err(AppError::Configuration(
                "ARREARS_RECEIPT_PREFIX cannot be empty".to_string(),
            ));
        }

        if self.arrears.default_payment_method.trim().is_empty() {
            return Err(AppError::Configuration(
                "ARREARS_DEFAULT_PAYMENT_METHOD cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
