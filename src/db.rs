use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// Connects to Postgres and brings the schema up to date.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;
    Ok(db)
}
