use anyhow::{Context, Result};
use config::{Config, Environment, File};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://netfix.db?mode=rwc";

/// Runtime configuration.
///
/// Read from an optional `netfix.toml` in the working directory, then from
/// `NETFIX_*` environment variables (after `.env` is loaded). Command-line
/// flags override both.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Log every SQL statement at debug level.
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            sqlx_logging: false,
        }
    }
}

impl Settings {
    /// Loads settings from `netfix.toml` (optional) and the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_sources(Config::builder()
            .add_source(File::with_name("netfix").required(false))
            .add_source(Environment::with_prefix("NETFIX")))
    }

    fn from_sources(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        debug!(?settings, "Configuration loaded");
        Ok(settings)
    }

    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        self
    }

    /// Connects using these settings. sqlx opens SQLite connections with
    /// foreign keys enforced, which the user to company cascade relies on.
    pub async fn connect(&self) -> Result<DatabaseConnection> {
        info!("Connecting to database: {}", self.database_url);
        // Every pooled connection to an in-memory SQLite URL is its own database
        let max_connections = if self.database_url.contains(":memory:") {
            1
        } else {
            self.max_connections
        };
        let mut options = ConnectOptions::new(self.database_url.clone());
        options
            .max_connections(max_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .sqlx_logging(self.sqlx_logging);

        let db = Database::connect(options)
            .await
            .with_context(|| format!("Failed to connect to database '{}'", self.database_url))?;

        debug!("Database connection established");
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_sources(Config::builder()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_overrides() {
        let builder = Config::builder()
            .set_override("database_url", "sqlite::memory:")
            .unwrap()
            .set_override("max_connections", 1)
            .unwrap();
        let settings = Settings::from_sources(builder)
            .unwrap()
            .with_database_url(None);
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.max_connections, 1);

        let settings = settings.with_database_url(Some("postgres://localhost/netfix".into()));
        assert_eq!(settings.database_url, "postgres://localhost/netfix");
    }

    #[tokio::test]
    async fn test_connect_enables_foreign_keys() {
        use sea_orm::{ConnectionTrait, DbBackend, Statement};

        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("fk.db").display());
        let db = Settings::default()
            .with_database_url(Some(url))
            .connect()
            .await
            .unwrap();

        for _ in 0..3 {
            let row = db
                .query_one(Statement::from_string(DbBackend::Sqlite, "PRAGMA foreign_keys"))
                .await
                .unwrap()
                .unwrap();
            let enabled: i32 = row.try_get_by_index(0).unwrap();
            assert_eq!(enabled, 1);
        }
    }
}
