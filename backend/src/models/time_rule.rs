use plexguard_shared::DayOfWeek;
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct TimeRule {
    pub id: i64,
    pub user_id: String,
    pub device_identifier: Option<String>,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub enabled: bool,
    pub rule_name: String,
}

impl TimeRule {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, AppError> {
        let rule = sqlx::query_as!(
            TimeRule,
            "SELECT id, user_id, device_identifier, day_of_week, start_time, end_time, enabled, rule_name
             FROM time_rules WHERE id = $1",
            id
        )
        .fetch_optional(pool)
        .await?;
        Ok(rule)
    }

    /// All enabled rules for a user, optionally scoped to a specific device.
    /// Rules with `device_identifier = NULL` apply to every device the user owns.
    pub async fn for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, AppError> {
        let rules = sqlx::query_as!(
            TimeRule,
            "SELECT id, user_id, device_identifier, day_of_week, start_time, end_time, enabled, rule_name
             FROM time_rules WHERE user_id = $1 AND enabled = true",
            user_id
        )
        .fetch_all(pool)
        .await?;
        Ok(rules)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, AppError> {
        let rules = sqlx::query_as!(
            TimeRule,
            "SELECT id, user_id, device_identifier, day_of_week, start_time, end_time, enabled, rule_name
             FROM time_rules WHERE user_id = $1 ORDER BY id",
            user_id
        )
        .fetch_all(pool)
        .await?;
        Ok(rules)
    }

    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        device_identifier: Option<&str>,
        day_of_week: DayOfWeek,
        start_time: &str,
        end_time: &str,
        enabled: bool,
        rule_name: &str,
    ) -> Result<Self, AppError> {
        let rule = sqlx::query_as!(
            TimeRule,
            r#"
            INSERT INTO time_rules (user_id, device_identifier, day_of_week, start_time, end_time, enabled, rule_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, device_identifier, day_of_week, start_time, end_time, enabled, rule_name
            "#,
            user_id,
            device_identifier,
            day_of_week,
            start_time,
            end_time,
            enabled,
            rule_name,
        )
        .fetch_one(pool)
        .await?;
        Ok(rule)
    }

    pub async fn update(
        pool: &PgPool,
        id: i64,
        day_of_week: Option<DayOfWeek>,
        start_time: Option<&str>,
        end_time: Option<&str>,
        enabled: Option<bool>,
        rule_name: Option<&str>,
    ) -> Result<Self, AppError> {
        let current = Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("time rule {id} not found")))?;

        let day_of_week = day_of_week.unwrap_or(current.day_of_week);
        let start_time = start_time.unwrap_or(&current.start_time);
        let end_time = end_time.unwrap_or(&current.end_time);
        let enabled = enabled.unwrap_or(current.enabled);
        let rule_name = rule_name.unwrap_or(&current.rule_name);

        let updated = sqlx::query_as!(
            TimeRule,
            r#"
            UPDATE time_rules SET day_of_week = $2, start_time = $3, end_time = $4, enabled = $5, rule_name = $6
            WHERE id = $1
            RETURNING id, user_id, device_identifier, day_of_week, start_time, end_time, enabled, rule_name
            "#,
            id,
            day_of_week,
            start_time,
            end_time,
            enabled,
            rule_name,
        )
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query!("DELETE FROM time_rules WHERE id = $1", id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
