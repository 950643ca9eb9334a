//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- App registrations: secret upload key <-> public device-facing name
CREATE TABLE IF NOT EXISTS apps (
    app_key TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- Current firmware image, at most one per app key
CREATE TABLE IF NOT EXISTS firmware (
    app_key TEXT PRIMARY KEY,
    hash TEXT NOT NULL,
    payload BLOB NOT NULL,
    uploaded_at TEXT NOT NULL
);
"#;
