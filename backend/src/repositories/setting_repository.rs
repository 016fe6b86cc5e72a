use plexguard_shared::SettingKind;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::Setting;

#[derive(Clone)]
pub struct SettingRepository {
    pool: Arc<PgPool>,
}

impl SettingRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn find(&self, key: &str) -> Result<Option<Setting>, AppError> {
        Setting::find(&self.pool, key).await
    }

    pub async fn list_all(&self) -> Result<Vec<Setting>, AppError> {
        Setting::list_all(&self.pool).await
    }

    pub async fn upsert(&self, key: &str, value: &serde_json::Value, kind: SettingKind, private: bool) -> Result<Setting, AppError> {
        Setting::upsert(&self.pool, key, value, kind, private).await
    }
}
