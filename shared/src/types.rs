use serde::{Deserialize, Serialize};
use std::fmt;

/// Approval state of a `(user_id, device_identifier)` pair.
///
/// Plexamp-product sessions are force-treated as approved at evaluation
/// time regardless of the stored value (spec §3 invariants) - that
/// override lives in the policy engine, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "device_status", rename_all = "lowercase")]
pub enum DeviceStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Pending => write!(f, "pending"),
            DeviceStatus::Approved => write!(f, "approved"),
            DeviceStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Per-user network-location restriction (spec §3 `UserPreference`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "network_policy", rename_all = "lowercase")]
pub enum NetworkPolicy {
    Both,
    Lan,
    Wan,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        NetworkPolicy::Both
    }
}

/// Whether a user's sessions are restricted to an explicit IP allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ip_access_policy", rename_all = "lowercase")]
pub enum IpAccessPolicy {
    All,
    Restricted,
}

impl Default for IpAccessPolicy {
    fn default() -> Self {
        IpAccessPolicy::All
    }
}

/// Which side of the admin/portal HTTP split a verified JWT belongs to.
///
/// The core only verifies tokens minted by an external auth collaborator
/// (spec §1 non-goals) - this is the claim it trusts after verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalRole {
    Admin,
    PortalUser,
}

/// Where a session's source address was classified as originating from
/// (spec §4.3.1 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionLocation {
    Lan,
    Wan,
}

/// Stable, machine-readable termination reason (spec §4.3.1, Glossary).
///
/// Distinct from the human-readable reason text surfaced to the end
/// user via the upstream `terminate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopCode {
    DevicePending,
    DeviceRejected,
    LanOnly,
    WanOnly,
    IpNotAllowed,
    TimeRestricted,
    ConcurrentLimit,
}

impl StopCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopCode::DevicePending => "DEVICE_PENDING",
            StopCode::DeviceRejected => "DEVICE_REJECTED",
            StopCode::LanOnly => "LAN_ONLY",
            StopCode::WanOnly => "WAN_ONLY",
            StopCode::IpNotAllowed => "IP_NOT_ALLOWED",
            StopCode::TimeRestricted => "TIME_RESTRICTED",
            StopCode::ConcurrentLimit => "CONCURRENT_LIMIT",
        }
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day-of-week as stored on a `TimeRule` row - `0` is Sunday, matching
/// `chrono::Weekday::num_days_from_sunday`.
pub type DayOfWeek = i16;

/// Typed value a `Setting` row can hold (spec §3, §9 "Runtime-typed
/// settings"). Persisted as `value: serde_json::Value` plus this tag so
/// typed getters can validate on read instead of guessing from shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "setting_kind", rename_all = "lowercase")]
pub enum SettingKind {
    String,
    Int,
    Bool,
    Json,
}
