//! Firmware and app registration database operations

use chrono::Utc;
use sqlx::SqlitePool;

use crate::firmware::hash;
use crate::firmware::{AppRegistration, FirmwareError, FirmwareRecord, FirmwareRepository};

impl From<sqlx::Error> for FirmwareError {
    fn from(err: sqlx::Error) -> Self {
        FirmwareError::Storage(err.to_string())
    }
}

/// SQLite-backed firmware repository
#[derive(Clone)]
pub struct SqliteFirmwareRepository {
    pool: SqlitePool,
}

impl SqliteFirmwareRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register an app
    ///
    /// Returns false, leaving the existing registration untouched, when the
    /// key is already registered. A name taken by another key is an error.
    pub async fn register_app(&self, app: &AppRegistration) -> Result<bool, FirmwareError> {
        let result = sqlx::query(
            r#"
            INSERT INTO apps (app_key, name)
            VALUES (?, ?)
            ON CONFLICT(app_key) DO NOTHING
            "#,
        )
        .bind(&app.key)
        .bind(&app.name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List all registered apps
    pub async fn list_apps(&self) -> Result<Vec<AppRegistration>, FirmwareError> {
        let apps = sqlx::query_as::<_, AppRegistration>(
            r#"
            SELECT app_key AS key, name
            FROM apps
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(apps)
    }
}

#[async_trait::async_trait]
impl FirmwareRepository for SqliteFirmwareRepository {
    async fn lookup_key_by_name(&self, name: &str) -> Result<Option<String>, FirmwareError> {
        let key = sqlx::query_scalar::<_, String>("SELECT app_key FROM apps WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(key)
    }

    async fn app_exists(&self, key: &str) -> Result<bool, FirmwareError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM apps WHERE app_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn get_record(&self, key: &str) -> Result<Option<FirmwareRecord>, FirmwareError> {
        let record = sqlx::query_as::<_, FirmwareRecord>(
            r#"
            SELECT app_key AS key, hash, payload, uploaded_at
            FROM firmware
            WHERE app_key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref record) = record {
            if !hash::verify(&record.payload, &record.hash) {
                tracing::error!(
                    key = %key,
                    stored_hash = %record.hash,
                    size = record.payload.len(),
                    "Stored firmware does not match its hash"
                );
                return Err(FirmwareError::Storage(format!(
                    "Firmware hash mismatch for key: {}",
                    key
                )));
            }
        }

        Ok(record)
    }

    async fn replace_record(
        &self,
        key: &str,
        hash: &str,
        payload: &[u8],
    ) -> Result<bool, FirmwareError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM firmware WHERE app_key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO firmware (app_key, hash, payload, uploaded_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(key)
        .bind(hash)
        .bind(payload)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(deleted.rows_affected() > 0)
    }
}
