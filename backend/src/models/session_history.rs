use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use plexguard_shared::SessionLocation;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

fn location_to_str(location: SessionLocation) -> &'static str {
    match location {
        SessionLocation::Lan => "lan",
        SessionLocation::Wan => "wan",
    }
}

fn location_from_str(value: &str) -> SessionLocation {
    match value {
        "lan" => SessionLocation::Lan,
        _ => SessionLocation::Wan,
    }
}

#[derive(Debug, Clone, FromRow)]
struct SessionHistoryRow {
    id: i64,
    session_key: String,
    user_id: String,
    device_identifier: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    location: String,
    ip: IpNetwork,
    stop_code: Option<String>,
    stop_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionHistoryEntry {
    pub id: i64,
    pub session_key: String,
    pub user_id: String,
    pub device_identifier: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub location: SessionLocation,
    pub ip: IpNetwork,
    pub stop_code: Option<String>,
    pub stop_reason: Option<String>,
}

impl From<SessionHistoryRow> for SessionHistoryEntry {
    fn from(row: SessionHistoryRow) -> Self {
        Self {
            id: row.id,
            session_key: row.session_key,
            user_id: row.user_id,
            device_identifier: row.device_identifier,
            started_at: row.started_at,
            ended_at: row.ended_at,
            location: location_from_str(&row.location),
            ip: row.ip,
            stop_code: row.stop_code,
            stop_reason: row.stop_reason,
        }
    }
}

impl SessionHistoryEntry {
    /// The open (unterminated) history row for a `(user, device)`, if the
    /// upstream reports that device as actively streaming.
    pub async fn find_open(
        pool: &PgPool,
        user_id: &str,
        device_identifier: &str,
    ) -> Result<Option<Self>, AppError> {
        let row = sqlx::query_as!(
            SessionHistoryRow,
            r#"
            SELECT id, session_key, user_id, device_identifier, started_at, ended_at,
                   location, ip, stop_code, stop_reason
            FROM session_history
            WHERE user_id = $1 AND device_identifier = $2 AND ended_at IS NULL
            "#,
            user_id,
            device_identifier
        )
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// All currently-open rows, for reconciling against the latest
    /// snapshot's set of live `session_key`s.
    pub async fn find_all_open(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let rows = sqlx::query_as!(
            SessionHistoryRow,
            r#"
            SELECT id, session_key, user_id, device_identifier, started_at, ended_at,
                   location, ip, stop_code, stop_reason
            FROM session_history
            WHERE ended_at IS NULL
            "#
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_open_by_session_key(pool: &PgPool, session_key: &str) -> Result<Option<Self>, AppError> {
        let row = sqlx::query_as!(
            SessionHistoryRow,
            r#"
            SELECT id, session_key, user_id, device_identifier, started_at, ended_at,
                   location, ip, stop_code, stop_reason
            FROM session_history
            WHERE session_key = $1 AND ended_at IS NULL
            "#,
            session_key
        )
        .fetch_optional(pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Opens a new history row for a session the orchestrator hasn't seen before.
    pub async fn start(
        pool: &PgPool,
        session_key: &str,
        user_id: &str,
        device_identifier: &str,
        started_at: DateTime<Utc>,
        location: SessionLocation,
        ip: IpNetwork,
    ) -> Result<Self, AppError> {
        let row = sqlx::query_as!(
            SessionHistoryRow,
            r#"
            INSERT INTO session_history (session_key, user_id, device_identifier, started_at, location, ip)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, session_key, user_id, device_identifier, started_at, ended_at,
                      location, ip, stop_code, stop_reason
            "#,
            session_key,
            user_id,
            device_identifier,
            started_at,
            location_to_str(location),
            ip,
        )
        .fetch_one(pool)
        .await?;
        Ok(row.into())
    }

    /// Closes a history row, recording why the session ended. A `None`
    /// `stop_code`/`stop_reason` means the client disconnected on its own.
    pub async fn close(
        pool: &PgPool,
        id: i64,
        ended_at: DateTime<Utc>,
        stop_code: Option<&str>,
        stop_reason: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query!(
            "UPDATE session_history SET ended_at = $2, stop_code = $3, stop_reason = $4 WHERE id = $1",
            id,
            ended_at,
            stop_code,
            stop_reason,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_device(
        pool: &PgPool,
        user_id: &str,
        device_identifier: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), AppError> {
        let rows = sqlx::query_as!(
            SessionHistoryRow,
            r#"
            SELECT id, session_key, user_id, device_identifier, started_at, ended_at,
                   location, ip, stop_code, stop_reason
            FROM session_history
            WHERE user_id = $1 AND device_identifier = $2
            ORDER BY started_at DESC
            LIMIT $3 OFFSET $4
            "#,
            user_id,
            device_identifier,
            limit,
            offset
        )
        .fetch_all(pool)
        .await?;

        let total = sqlx::query_scalar!(
            "SELECT COUNT(*) FROM session_history WHERE user_id = $1 AND device_identifier = $2",
            user_id,
            device_identifier
        )
        .fetch_one(pool)
        .await?
        .unwrap_or(0);

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}
