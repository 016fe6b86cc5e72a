use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use plexguard_shared::DeviceStatus;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::Device;

use super::{PaginatedResult, PaginationParams};

#[derive(Clone)]
pub struct DeviceRepository {
    pool: Arc<PgPool>,
}

impl DeviceRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Device>, AppError> {
        Device::find_by_id(&self.pool, id).await
    }

    pub async fn find_by_user_and_identifier(&self, user_id: &str, device_identifier: &str) -> Result<Option<Device>, AppError> {
        Device::find_by_user_and_identifier(&self.pool, user_id, device_identifier).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_seen(
        &self,
        user_id: &str,
        device_identifier: &str,
        name: &str,
        platform: Option<&str>,
        product: Option<&str>,
        version: Option<&str>,
        seen_at: DateTime<Utc>,
        ip: IpNetwork,
    ) -> Result<(Device, bool), AppError> {
        Device::upsert_seen(&self.pool, user_id, device_identifier, name, platform, product, version, seen_at, ip).await
    }

    pub async fn list_for_user(&self, user_id: &str, pagination: PaginationParams) -> Result<PaginatedResult<Device>, AppError> {
        let (data, total) = Device::list_for_user(&self.pool, user_id, pagination.limit, pagination.offset).await?;
        Ok(PaginatedResult::new(data, total, pagination.limit, pagination.offset))
    }

    pub async fn list_all(&self, pagination: PaginationParams) -> Result<PaginatedResult<Device>, AppError> {
        let (data, total) = Device::list_all(&self.pool, pagination.limit, pagination.offset).await?;
        Ok(PaginatedResult::new(data, total, pagination.limit, pagination.offset))
    }

    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        status: Option<DeviceStatus>,
        exclude_from_concurrent_limit: Option<bool>,
    ) -> Result<Device, AppError> {
        Device::update(&self.pool, id, name, status, exclude_from_concurrent_limit).await
    }

    pub async fn grant_temp_access(
        &self,
        id: i64,
        until: DateTime<Utc>,
        bypass_policies: bool,
        granted_at: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<Device, AppError> {
        Device::grant_temp_access(&self.pool, id, until, bypass_policies, granted_at, duration_minutes).await
    }

    pub async fn revoke_temp_access(&self, id: i64) -> Result<Device, AppError> {
        Device::revoke_temp_access(&self.pool, id).await
    }

    pub async fn submit_note(&self, id: i64, description: &str, at: DateTime<Utc>) -> Result<Device, AppError> {
        Device::submit_note(&self.pool, id, description, at).await
    }

    pub async fn mark_note_read(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        Device::mark_note_read(&self.pool, id, at).await
    }

    pub async fn increment_session_count(&self, id: i64) -> Result<(), AppError> {
        Device::increment_session_count(&self.pool, id).await
    }

    pub async fn find_stale(&self, older_than: DateTime<Utc>) -> Result<Vec<Device>, AppError> {
        Device::find_stale(&self.pool, older_than).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Device::delete(&self.pool, id).await
    }
}
