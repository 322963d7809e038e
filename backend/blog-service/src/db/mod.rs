/// Database access layer: pool setup and one repository module per table
pub mod comment_repo;
pub mod pending_signup_repo;
pub mod post_repo;
pub mod user_repo;

use crate::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Create the pool and verify it answers within the connect timeout
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let timeout = Duration::from_secs(config.connect_timeout_secs);
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    match tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(&pool)).await {
        Ok(Ok(_)) => {
            info!(
                max_connections = config.max_connections,
                "Database pool created and verified"
            );
            Ok(pool)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(sqlx::Error::PoolTimedOut),
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
