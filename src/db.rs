use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Apply the embedded `migrations/` directory.
pub async fn run_migrations(pool: &MySqlPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")
}
