use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::AccountArgs;
use crate::settings::Settings;

/// Create an in-memory SQLite database with all migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Settings::default()
        .with_database_url(Some("sqlite::memory:".to_string()))
        .connect()
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn account(username: &str) -> AccountArgs {
    AccountArgs {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: None,
        first_name: String::new(),
        last_name: String::new(),
    }
}

/// Writes `contents` to a temporary `.json` file kept alive by the guard.
pub fn json_fixture(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create fixture file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write fixture file");
    file
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level is taken from RUST_LOG, defaulting to WARN.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| match level.to_uppercase().as_str() {
            "ERROR" => Some(Level::ERROR),
            "WARN" => Some(Level::WARN),
            "INFO" => Some(Level::INFO),
            "DEBUG" => Some(Level::DEBUG),
            "TRACE" => Some(Level::TRACE),
            _ => None,
        })
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}
