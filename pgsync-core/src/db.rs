use std::time::Duration;

use pgsync_config::PostgresConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::Result;

/// Opens a connection pool against the source Postgres database.
///
/// Mirrors the teacher's `PostgresDatabase::connect` sizing: a handful of
/// connections is plenty for a single-writer extraction loop, with
/// `test_before_acquire` so a connection killed by the server mid-idle is
/// never handed back out.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.connection_string())
        .await?;

    info!(host = %config.host, dbname = %config.dbname, "connected to source database");
    Ok(pool)
}
