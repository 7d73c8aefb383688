use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

/// The full database schema. Statements are written to be idempotent so the bootstrap
/// can run on every startup.
const SCHEMA_SQL: &str = include_str!("../db/schema.sql");

/// Builds a connection pool against the given PostgreSQL URL.
pub async fn connect_sqlx(db_url: &str) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(2))
        .connect(db_url)
        .await
        .context("Connecting to the database")?;

    Ok(pool)
}

/// Applies the schema in db/schema.sql to the connected database. Every statement is
/// guarded with IF NOT EXISTS (or the enum-type equivalent), so re-running against an
/// already-provisioned database is a no-op.
pub async fn bootstrap_schema(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .context("Applying the database schema")?;
    info!("Database schema is up to date.");

    Ok(())
}
