//! Core configuration

use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Tax rate used when no `iva_percentage` setting has been stored yet
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 0);

/// Store connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `postgres://…`, `postgresql://…` or `sqlite:…`
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_millis(5000),
        }
    }
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Seeded into settings the first time the tax rate is read
    pub default_tax_rate: Decimal,
    pub log_level: String,
    /// Daily rolling log files go here when the directory exists
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BoxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let url = var("DATABASE_URL").ok_or("DATABASE_URL must be set")?;

        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("DB_MAX_CONNECTIONS: {e}"))?
                .max(1),
            None => 10,
        };
        let acquire_timeout_ms = match var("DB_ACQUIRE_TIMEOUT_MS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("DB_ACQUIRE_TIMEOUT_MS: {e}"))?,
            None => 5000,
        };

        let default_tax_rate = match var("DEFAULT_TAX_RATE") {
            Some(v) => {
                let rate = Decimal::from_str(v.trim())
                    .map_err(|e| format!("DEFAULT_TAX_RATE: {e}"))?;
                if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                    return Err(format!("DEFAULT_TAX_RATE must be within 0..=100, got {rate}").into());
                }
                rate
            }
            None => DEFAULT_TAX_RATE,
        };

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
                acquire_timeout: Duration::from_millis(acquire_timeout_ms),
            },
            default_tax_rate,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: var("LOG_DIR"),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".into()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
