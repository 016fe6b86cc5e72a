use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use plexguard_shared::SessionLocation;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::SessionHistoryEntry;

use super::{PaginatedResult, PaginationParams};

#[derive(Clone)]
pub struct SessionHistoryRepository {
    pool: Arc<PgPool>,
}

impl SessionHistoryRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn find_open(&self, user_id: &str, device_identifier: &str) -> Result<Option<SessionHistoryEntry>, AppError> {
        SessionHistoryEntry::find_open(&self.pool, user_id, device_identifier).await
    }

    pub async fn find_open_by_session_key(&self, session_key: &str) -> Result<Option<SessionHistoryEntry>, AppError> {
        SessionHistoryEntry::find_open_by_session_key(&self.pool, session_key).await
    }

    pub async fn find_all_open(&self) -> Result<Vec<SessionHistoryEntry>, AppError> {
        SessionHistoryEntry::find_all_open(&self.pool).await
    }

    pub async fn start(
        &self,
        session_key: &str,
        user_id: &str,
        device_identifier: &str,
        started_at: DateTime<Utc>,
        location: SessionLocation,
        ip: IpNetwork,
    ) -> Result<SessionHistoryEntry, AppError> {
        SessionHistoryEntry::start(&self.pool, session_key, user_id, device_identifier, started_at, location, ip).await
    }

    pub async fn close(
        &self,
        id: i64,
        ended_at: DateTime<Utc>,
        stop_code: Option<&str>,
        stop_reason: Option<&str>,
    ) -> Result<(), AppError> {
        SessionHistoryEntry::close(&self.pool, id, ended_at, stop_code, stop_reason).await
    }

    pub async fn list_for_device(
        &self,
        user_id: &str,
        device_identifier: &str,
        pagination: PaginationParams,
    ) -> Result<PaginatedResult<SessionHistoryEntry>, AppError> {
        let (data, total) =
            SessionHistoryEntry::list_for_device(&self.pool, user_id, device_identifier, pagination.limit, pagination.offset).await?;
        Ok(PaginatedResult::new(data, total, pagination.limit, pagination.offset))
    }
}
