use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// `storage_path` value that keeps the database in memory.
pub const IN_MEMORY: &str = ":memory:";

static MIGRATOR: Migrator = sqlx::migrate!();

/// Opens (creating if needed) and migrates the device database.
pub async fn connect(location: &str) -> anyhow::Result<SqlitePool> {
    let pool = if location == IN_MEMORY {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // every connection to :memory: is a separate database
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?
    } else {
        let path = Path::new(location);
        if let Some(parent) = path.parent().filter(|it| !it.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", path.display()))?
    };
    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to migrate device database")?;
    Ok(pool)
}
