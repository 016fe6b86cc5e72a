use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use plexguard_shared::DeviceStatus;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct Device {
    pub id: i64,
    pub user_id: String,
    pub device_identifier: String,
    pub name: String,
    pub platform: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub status: DeviceStatus,
    pub exclude_from_concurrent_limit: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_ip: Option<IpNetwork>,
    pub session_count: i64,
    pub temp_access_until: Option<DateTime<Utc>>,
    pub temp_access_bypass_policies: bool,
    pub temp_access_granted_at: Option<DateTime<Utc>>,
    pub temp_access_duration_minutes: Option<i32>,
    pub note_description: Option<String>,
    pub note_submitted_at: Option<DateTime<Utc>>,
    pub note_read_at: Option<DateTime<Utc>>,
}

impl Device {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, AppError> {
        let device = sqlx::query_as!(
            Device,
            r#"
            SELECT
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            FROM devices WHERE id = $1
            "#,
            id
        )
        .fetch_optional(pool)
        .await?;
        Ok(device)
    }

    pub async fn find_by_user_and_identifier(
        pool: &PgPool,
        user_id: &str,
        device_identifier: &str,
    ) -> Result<Option<Self>, AppError> {
        let device = sqlx::query_as!(
            Device,
            r#"
            SELECT
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            FROM devices WHERE user_id = $1 AND device_identifier = $2
            "#,
            user_id,
            device_identifier
        )
        .fetch_optional(pool)
        .await?;
        Ok(device)
    }

    /// Inserts a never-seen-before device as `Pending`, or updates the
    /// last-seen bookkeeping for a known one. Does not touch `status` or
    /// `session_count` on the known-device path - those are owned by the
    /// device registry, not by raw ingest.
    pub async fn upsert_seen(
        pool: &PgPool,
        user_id: &str,
        device_identifier: &str,
        name: &str,
        platform: Option<&str>,
        product: Option<&str>,
        version: Option<&str>,
        seen_at: DateTime<Utc>,
        ip: IpNetwork,
    ) -> Result<(Self, bool), AppError> {
        let existing = Self::find_by_user_and_identifier(pool, user_id, device_identifier).await?;

        if let Some(existing) = existing {
            let updated = sqlx::query_as!(
                Device,
                r#"
                UPDATE devices SET
                    name = $3, platform = $4, product = $5, version = $6,
                    last_seen = $7, last_ip = $8
                WHERE id = $1 AND user_id = $2
                RETURNING
                    id, user_id, device_identifier, name, platform, product, version,
                    status as "status: DeviceStatus", exclude_from_concurrent_limit,
                    first_seen, last_seen, last_ip, session_count,
                    temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                    note_description, note_submitted_at, note_read_at
                "#,
                existing.id,
                user_id,
                name,
                platform,
                product,
                version,
                seen_at,
                ip,
            )
            .fetch_one(pool)
            .await?;
            return Ok((updated, false));
        }

        let created = sqlx::query_as!(
            Device,
            r#"
            INSERT INTO devices (
                user_id, device_identifier, name, platform, product, version,
                status, first_seen, last_seen, last_ip
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $7, $8)
            RETURNING
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            "#,
            user_id,
            device_identifier,
            name,
            platform,
            product,
            version,
            seen_at,
            ip,
        )
        .fetch_one(pool)
        .await?;
        Ok((created, true))
    }

    pub async fn list_for_user(pool: &PgPool, user_id: &str, limit: i64, offset: i64) -> Result<(Vec<Self>, i64), AppError> {
        let devices = sqlx::query_as!(
            Device,
            r#"
            SELECT
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            FROM devices WHERE user_id = $1
            ORDER BY last_seen DESC
            LIMIT $2 OFFSET $3
            "#,
            user_id,
            limit,
            offset
        )
        .fetch_all(pool)
        .await?;

        let total = sqlx::query_scalar!("SELECT COUNT(*) FROM devices WHERE user_id = $1", user_id)
            .fetch_one(pool)
            .await?
            .unwrap_or(0);

        Ok((devices, total))
    }

    pub async fn list_all(pool: &PgPool, limit: i64, offset: i64) -> Result<(Vec<Self>, i64), AppError> {
        let devices = sqlx::query_as!(
            Device,
            r#"
            SELECT
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            FROM devices
            ORDER BY last_seen DESC
            LIMIT $1 OFFSET $2
            "#,
            limit,
            offset
        )
        .fetch_all(pool)
        .await?;

        let total = sqlx::query_scalar!("SELECT COUNT(*) FROM devices")
            .fetch_one(pool)
            .await?
            .unwrap_or(0);

        Ok((devices, total))
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        name: Option<&str>,
        status: Option<DeviceStatus>,
        exclude_from_concurrent_limit: Option<bool>,
    ) -> Result<Self, AppError> {
        let current = Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("device {id} not found")))?;

        let name = name.unwrap_or(&current.name);
        let status = status.unwrap_or(current.status);
        let exclude = exclude_from_concurrent_limit.unwrap_or(current.exclude_from_concurrent_limit);

        let updated = sqlx::query_as!(
            Device,
            r#"
            UPDATE devices SET name = $2, status = $3, exclude_from_concurrent_limit = $4
            WHERE id = $1
            RETURNING
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            "#,
            id,
            name,
            status as DeviceStatus,
            exclude,
        )
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn grant_temp_access(
        pool: &PgPool,
        id: i64,
        until: DateTime<Utc>,
        bypass_policies: bool,
        granted_at: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<Self, AppError> {
        let updated = sqlx::query_as!(
            Device,
            r#"
            UPDATE devices SET
                temp_access_until = $2, temp_access_bypass_policies = $3,
                temp_access_granted_at = $4, temp_access_duration_minutes = $5
            WHERE id = $1
            RETURNING
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            "#,
            id,
            until,
            bypass_policies,
            granted_at,
            duration_minutes,
        )
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    /// Clears an active temporary-access grant without touching its history
    /// (`granted_at`/`duration_minutes` describe the grant that was revoked).
    pub async fn revoke_temp_access(pool: &PgPool, id: i64) -> Result<Self, AppError> {
        let updated = sqlx::query_as!(
            Device,
            r#"
            UPDATE devices SET temp_access_until = NULL, temp_access_bypass_policies = FALSE
            WHERE id = $1
            RETURNING
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            "#,
            id,
        )
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    pub async fn submit_note(pool: &PgPool, id: i64, description: &str, at: DateTime<Utc>) -> Result<Self, AppError> {
        let updated = sqlx::query_as!(
            Device,
            r#"
            UPDATE devices SET note_description = $2, note_submitted_at = $3, note_read_at = NULL
            WHERE id = $1
            RETURNING
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            "#,
            id,
            description,
            at,
        )
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    pub async fn mark_note_read(pool: &PgPool, id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query!("UPDATE devices SET note_read_at = $2 WHERE id = $1", id, at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Called by the registry exactly once per session it classifies as
    /// newly started, after history reconciliation.
    pub async fn increment_session_count(pool: &PgPool, id: i64) -> Result<(), AppError> {
        sqlx::query!("UPDATE devices SET session_count = session_count + 1 WHERE id = $1", id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn find_stale(pool: &PgPool, older_than: DateTime<Utc>) -> Result<Vec<Self>, AppError> {
        let devices = sqlx::query_as!(
            Device,
            r#"
            SELECT
                id, user_id, device_identifier, name, platform, product, version,
                status as "status: DeviceStatus", exclude_from_concurrent_limit,
                first_seen, last_seen, last_ip, session_count,
                temp_access_until, temp_access_bypass_policies, temp_access_granted_at, temp_access_duration_minutes,
                note_description, note_submitted_at, note_read_at
            FROM devices WHERE last_seen < $1
            "#,
            older_than
        )
        .fetch_all(pool)
        .await?;
        Ok(devices)
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query!("DELETE FROM devices WHERE id = $1", id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
