//! Thin repositories over the model layer, giving services a single place
//! to depend on for persistence instead of reaching into `models` directly.

use sqlx::PgPool;
use std::sync::Arc;

pub mod device_repository;
pub mod session_history_repository;
pub mod setting_repository;
pub mod time_rule_repository;
pub mod user_preference_repository;

pub use device_repository::DeviceRepository;
pub use session_history_repository::SessionHistoryRepository;
pub use setting_repository::SettingRepository;
pub use time_rule_repository::TimeRuleRepository;
pub use user_preference_repository::UserPreferenceRepository;

#[derive(Clone)]
pub struct Repositories {
    pub devices: DeviceRepository,
    pub user_preferences: UserPreferenceRepository,
    pub time_rules: TimeRuleRepository,
    pub session_history: SessionHistoryRepository,
    pub settings: SettingRepository,
}

impl Repositories {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            devices: DeviceRepository::new(pool.clone()),
            user_preferences: UserPreferenceRepository::new(pool.clone()),
            time_rules: TimeRuleRepository::new(pool.clone()),
            session_history: SessionHistoryRepository::new(pool.clone()),
            settings: SettingRepository::new(pool),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    pub limit: i64,
    pub offset: i64,
}

impl PaginationParams {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(plexguard_shared::DEFAULT_PAGE_SIZE).clamp(1, plexguard_shared::MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self { data, total, limit, offset }
    }

    pub fn has_more(&self) -> bool {
        self.offset + self.limit < self.total
    }
}
