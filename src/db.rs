use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DatabaseConfig;

/// Validates the config, then opens the shared pool.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let options = config.connect_options()?;
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.timeout)
        .connect_with(options)
        .await
        .context("connect to database")?;
    tracing::info!(host = %config.host, schema = %config.schema, "database pool ready");
    Ok(db)
}
