//! Database Test Utilities
//!
//! Starts a throwaway PostgreSQL container, applies the ledger migrations and
//! hands back a ready [`PgStore`]. Tests using it need Docker and are marked
//! `#[ignore]`.

use std::sync::Arc;

use infra_db::{create_pool, run_migrations, DatabaseConfig, DatabasePool, PgStore};
use testcontainers_modules::postgres::Postgres;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;

const POSTGRES_USER: &str = "postgres";
const POSTGRES_PASSWORD: &str = "postgres";
const POSTGRES_DB: &str = "postgres";

/// Every table the migrations create
const LEDGER_TABLES: [&str; 5] = ["bills", "medicines", "services", "patients", "sequences"];

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated PostgreSQL container; dropped with the value
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: DatabasePool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container and applies the migrations
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let container = Postgres::default().start().await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let pool_config = DatabaseConfig::new(config.connection_url())
            .max_connections(5)
            .min_connections(1);
        let pool = create_pool(pool_config).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    /// A store over this database
    pub fn store(&self) -> Arc<PgStore> {
        Arc::new(PgStore::new(self.pool.clone()))
    }

    /// Removes every record and resets the code counters
    pub async fn clear_data(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let statement = format!("TRUNCATE TABLE {} CASCADE", LEDGER_TABLES.join(", "));
        sqlx::query(&statement).execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let config = TestDatabaseConfig::default();
        let url = config.connection_url();

        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.ends_with(POSTGRES_DB));
    }
}
