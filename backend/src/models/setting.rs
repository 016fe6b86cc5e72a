use chrono::{DateTime, Utc};
use plexguard_shared::SettingKind;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub kind: SettingKind,
    pub private: bool,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub async fn find(pool: &PgPool, key: &str) -> Result<Option<Self>, AppError> {
        let setting = sqlx::query_as!(
            Setting,
            r#"SELECT key, value, kind as "kind: SettingKind", private, updated_at FROM settings WHERE key = $1"#,
            key
        )
        .fetch_optional(pool)
        .await?;
        Ok(setting)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let settings = sqlx::query_as!(
            Setting,
            r#"SELECT key, value, kind as "kind: SettingKind", private, updated_at FROM settings ORDER BY key"#
        )
        .fetch_all(pool)
        .await?;
        Ok(settings)
    }

    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: &serde_json::Value,
        kind: SettingKind,
        private: bool,
    ) -> Result<Self, AppError> {
        let setting = sqlx::query_as!(
            Setting,
            r#"
            INSERT INTO settings (key, value, kind, private)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, kind as "kind: SettingKind", private, updated_at
            "#,
            key,
            value,
            kind as SettingKind,
            private,
        )
        .fetch_one(pool)
        .await?;
        Ok(setting)
    }
}
