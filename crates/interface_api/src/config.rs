//! API configuration

use std::time::Duration;

use core_kernel::Currency;
use domain_billing::{BillingSettings, DEFAULT_CONSULTATION_FEE};
use infra_db::DatabaseConfig;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Where the ledger keeps its records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local store, lost on restart
    #[default]
    Memory,
    /// PostgreSQL at `database_url`
    Postgres,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Storage backend
    pub storage: StorageBackend,
    /// Database URL, used when `storage` is `postgres`
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Seconds a request waits for a pooled connection
    pub db_acquire_timeout_secs: u64,
    /// Seconds before a connection is recycled, 0 keeps it forever
    pub db_max_lifetime_secs: u64,
    /// Seconds an unused connection stays open, 0 keeps it forever
    pub db_idle_timeout_secs: u64,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Currency every amount is recorded in
    pub currency: Currency,
    /// Fee charged when a bill does not name one
    pub consultation_fee: Decimal,
    /// Operator login
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let pool = DatabaseConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            storage: StorageBackend::Memory,
            db_max_connections: pool.max_connections,
            db_min_connections: pool.min_connections,
            db_acquire_timeout_secs: pool.acquire_timeout.as_secs(),
            db_max_lifetime_secs: pool.max_lifetime.map_or(0, |d| d.as_secs()),
            db_idle_timeout_secs: pool.idle_timeout.map_or(0, |d| d.as_secs()),
            database_url: pool.url,
            log_level: "info".to_string(),
            log_json: false,
            currency: Currency::INR,
            consultation_fee: DEFAULT_CONSULTATION_FEE,
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables over the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_secs", defaults.jwt_expiration_secs as i64)?
            .set_default("storage", "memory")?
            .set_default("database_url", defaults.database_url)?
            .set_default("db_max_connections", i64::from(defaults.db_max_connections))?
            .set_default("db_min_connections", i64::from(defaults.db_min_connections))?
            .set_default("db_acquire_timeout_secs", defaults.db_acquire_timeout_secs as i64)?
            .set_default("db_max_lifetime_secs", defaults.db_max_lifetime_secs as i64)?
            .set_default("db_idle_timeout_secs", defaults.db_idle_timeout_secs as i64)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_json", defaults.log_json)?
            .set_default("currency", defaults.currency.code())?
            .set_default("consultation_fee", defaults.consultation_fee.to_string())?
            .set_default("admin_username", defaults.admin_username)?
            .set_default("admin_password", defaults.admin_password)?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool settings for the PostgreSQL backend
    pub fn database_config(&self) -> DatabaseConfig {
        let seconds = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .acquire_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
            .max_lifetime(seconds(self.db_max_lifetime_secs))
            .idle_timeout(seconds(self.db_idle_timeout_secs))
    }

    /// Ledger settings derived from this configuration
    pub fn billing_settings(&self) -> BillingSettings {
        BillingSettings {
            consultation_fee: self.consultation_fee,
            currency: self.currency,
            ..BillingSettings::default()
        }
    }
}
