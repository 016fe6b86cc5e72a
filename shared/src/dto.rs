use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ---------------------------------------------------------------------
// Pagination (shape matches every list endpoint on the admin/portal surface)
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceResponse {
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
    pub last_ip: Option<String>,
    pub session_count: i64,
    pub temp_access_until: Option<DateTime<Utc>>,
    pub temp_access_bypass_policies: bool,
    pub temp_access_granted_at: Option<DateTime<Utc>>,
    pub temp_access_duration_minutes: Option<i32>,
    pub note_description: Option<String>,
    pub note_submitted_at: Option<DateTime<Utc>>,
    pub note_read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDeviceRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    pub status: Option<DeviceStatus>,
    pub exclude_from_concurrent_limit: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantTempAccessRequest {
    #[validate(range(min = 1, max = 100_000))]
    pub duration_minutes: i64,
    #[serde(default)]
    pub bypass_policies: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitDeviceNoteRequest {
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
}

// ---------------------------------------------------------------------
// User preferences
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPreferenceResponse {
    pub user_id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub hidden: bool,
    pub default_block: Option<bool>,
    pub network_policy: NetworkPolicy,
    pub ip_access_policy: IpAccessPolicy,
    pub allowed_ips: Vec<String>,
    pub concurrent_stream_limit: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserPreferenceRequest {
    pub default_block: Option<bool>,
    pub network_policy: Option<NetworkPolicy>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIpPolicyRequest {
    pub ip_access_policy: IpAccessPolicy,
    pub allowed_ips: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConcurrentLimitRequest {
    /// `None` falls back to the global setting; `Some(0)` is unlimited.
    pub concurrent_stream_limit: Option<i32>,
}

// ---------------------------------------------------------------------
// Time rules
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeRuleResponse {
    pub id: i64,
    pub user_id: String,
    pub device_identifier: Option<String>,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub enabled: bool,
    pub rule_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTimeRuleRequest {
    pub device_identifier: Option<String>,
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: DayOfWeek,
    #[validate(length(equal = 5))]
    pub start_time: String,
    #[validate(length(equal = 5))]
    pub end_time: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[validate(length(min = 1, max = 120))]
    pub rule_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTimeRuleRequest {
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: Option<DayOfWeek>,
    #[validate(length(equal = 5))]
    pub start_time: Option<String>,
    #[validate(length(equal = 5))]
    pub end_time: Option<String>,
    pub enabled: Option<bool>,
    #[validate(length(min = 1, max = 120))]
    pub rule_name: Option<String>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_key: String,
    pub session_id: String,
    pub user_id: String,
    pub username: String,
    pub device_identifier: String,
    pub device_name: String,
    pub platform: Option<String>,
    pub product: Option<String>,
    pub address: String,
    pub location: SessionLocation,
    pub title: String,
    pub grandparent_title: Option<String>,
    pub session_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TerminateSessionRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

// ---------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: serde_json::Value,
    pub kind: SettingKind,
    pub private: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingRequest {
    pub value: serde_json::Value,
}

// ---------------------------------------------------------------------
// Events (what the Event Bus publishes; also the shape notifiers see)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreEvent {
    NewDevice {
        user_id: String,
        device_identifier: String,
        at: DateTime<Utc>,
    },
    LocationChange {
        user_id: String,
        device_identifier: String,
        old_ip: String,
        new_ip: String,
        at: DateTime<Utc>,
    },
    ReturnedDevice {
        user_id: String,
        device_identifier: String,
        inactive_for_hours: i64,
        at: DateTime<Utc>,
    },
    DeviceNoteSubmitted {
        user_id: String,
        device_identifier: String,
        at: DateTime<Utc>,
    },
    StreamBlocked {
        user_id: String,
        device_identifier: String,
        session_key: String,
        stop_code: String,
        ip: String,
        at: DateTime<Utc>,
    },
}

// ---------------------------------------------------------------------
// Misc identifiers used in path extraction
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceIdPath {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserIdPath {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleIdPath {
    pub id: i64,
}
