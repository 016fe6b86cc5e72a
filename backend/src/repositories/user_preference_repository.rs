use ipnetwork::IpNetwork;
use plexguard_shared::{IpAccessPolicy, NetworkPolicy};
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::UserPreference;

use super::{PaginatedResult, PaginationParams};

#[derive(Clone)]
pub struct UserPreferenceRepository {
    pool: Arc<PgPool>,
}

impl UserPreferenceRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn find_or_default(&self, user_id: &str) -> Result<UserPreference, AppError> {
        UserPreference::find_or_default(&self.pool, user_id).await
    }

    pub async fn upsert_identity(&self, user_id: &str, username: Option<&str>, avatar_url: Option<&str>) -> Result<(), AppError> {
        UserPreference::upsert_identity(&self.pool, user_id, username, avatar_url).await
    }

    pub async fn update_policy(
        &self,
        user_id: &str,
        default_block: Option<bool>,
        network_policy: Option<NetworkPolicy>,
    ) -> Result<UserPreference, AppError> {
        UserPreference::update_policy(&self.pool, user_id, default_block, network_policy).await
    }

    pub async fn update_ip_policy(
        &self,
        user_id: &str,
        ip_access_policy: IpAccessPolicy,
        allowed_ips: &[IpNetwork],
    ) -> Result<UserPreference, AppError> {
        UserPreference::update_ip_policy(&self.pool, user_id, ip_access_policy, allowed_ips).await
    }

    pub async fn update_concurrent_limit(&self, user_id: &str, concurrent_stream_limit: Option<i32>) -> Result<UserPreference, AppError> {
        UserPreference::update_concurrent_limit(&self.pool, user_id, concurrent_stream_limit).await
    }

    pub async fn set_hidden(&self, user_id: &str, hidden: bool) -> Result<UserPreference, AppError> {
        UserPreference::set_hidden(&self.pool, user_id, hidden).await
    }

    pub async fn list_all(&self, pagination: PaginationParams) -> Result<PaginatedResult<UserPreference>, AppError> {
        let (data, total) = UserPreference::list_all(&self.pool, pagination.limit, pagination.offset).await?;
        Ok(PaginatedResult::new(data, total, pagination.limit, pagination.offset))
    }
}
