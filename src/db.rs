use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::users::repo::EMAIL_UNIQUE_INDEX;

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Declare the `users` table and its email index if they are missing.
pub async fn ensure_schema(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            UUID PRIMARY KEY,
            seq           BIGINT GENERATED ALWAYS AS IDENTITY,
            email         TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            name          TEXT NOT NULL,
            created_at    TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(db)
    .await
    .context("create users table")?;

    sqlx::query(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {EMAIL_UNIQUE_INDEX} ON users (email)"
    ))
    .execute(db)
    .await
    .context("create users email index")?;

    tracing::info!("users schema ready");
    Ok(())
}
