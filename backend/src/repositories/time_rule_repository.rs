use plexguard_shared::DayOfWeek;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::TimeRule;

#[derive(Clone)]
pub struct TimeRuleRepository {
    pool: Arc<PgPool>,
}

impl TimeRuleRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<TimeRule>, AppError> {
        TimeRule::find_by_id(&self.pool, id).await
    }

    /// Enabled rules only - what the policy engine evaluates against.
    pub async fn for_user(&self, user_id: &str) -> Result<Vec<TimeRule>, AppError> {
        TimeRule::for_user(&self.pool, user_id).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<TimeRule>, AppError> {
        TimeRule::list_for_user(&self.pool, user_id).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        user_id: &str,
        device_identifier: Option<&str>,
        day_of_week: DayOfWeek,
        start_time: &str,
        end_time: &str,
        enabled: bool,
        rule_name: &str,
    ) -> Result<TimeRule, AppError> {
        TimeRule::create(&self.pool, user_id, device_identifier, day_of_week, start_time, end_time, enabled, rule_name).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: i64,
        day_of_week: Option<DayOfWeek>,
        start_time: Option<&str>,
        end_time: Option<&str>,
        enabled: Option<bool>,
        rule_name: Option<&str>,
    ) -> Result<TimeRule, AppError> {
        TimeRule::update(&self.pool, id, day_of_week, start_time, end_time, enabled, rule_name).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        TimeRule::delete(&self.pool, id).await
    }
}
