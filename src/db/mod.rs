pub mod models;

use crate::config::DatabaseConfig;
use crate::error::{Result, StorageContext};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

pub type DbPool = Pool<Sqlite>;

/// Create the parent directory of a file-backed SQLite database
async fn ensure_parent_dir(database_url: &str) -> Result<()> {
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        if is_memory(database_url) {
            return Ok(());
        }
        let path = path.trim_start_matches("//");
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }
    Ok(())
}

fn is_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Initialize database connection pool
///
/// Each in-memory SQLite connection is its own database, so memory URLs get
/// a single-connection pool.
pub async fn init_pool(database_url: &str) -> Result<DbPool> {
    ensure_parent_dir(database_url).await?;

    let mut options = SqlitePoolOptions::new().max_connections(10);
    if is_memory(database_url) {
        // Closing the only connection would drop the database
        options = options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = options
        .connect(&with_create_flag(database_url))
        .await
        .storage("connect")?;
    Ok(pool)
}

/// Initialize database connection pool with custom configuration
pub async fn init_pool_with_config(config: &DatabaseConfig) -> Result<DbPool> {
    ensure_parent_dir(&config.url).await?;

    let (max_connections, min_connections) = if is_memory(&config.url) {
        (1, 1)
    } else {
        (config.max_connections, config.min_connections)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&with_create_flag(&config.url))
        .await
        .storage("connect")?;

    Ok(pool)
}

/// File databases are created on first connect
fn with_create_flag(database_url: &str) -> String {
    if is_memory(database_url) || database_url.contains("mode=") {
        database_url.to_string()
    } else if database_url.contains('?') {
        format!("{database_url}&mode=rwc")
    } else {
        format!("{database_url}?mode=rwc")
    }
}

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
