//! Constants shared between the core and its HTTP callers: setting keys
//! (spec §6), default reason messages, and pagination/validation limits.

// Pagination defaults (mirrors the donor workspace's list-endpoint shape)
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// Poll scheduler
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15;

// Device lifecycle
pub const DEFAULT_RETURNED_DEVICE_THRESHOLD_HOURS: i64 = 24;
pub const DEFAULT_CLEANUP_THRESHOLD_DAYS: i64 = 90;

// Upstream client
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

// Setting keys recognized by the core (spec §6 table). Kept as constants
// rather than a closed enum because operators may define additional,
// core-ignored keys the admin UI still wants to store.
pub const SETTING_PLEX_SERVER_IP: &str = "PLEX_SERVER_IP";
pub const SETTING_PLEX_SERVER_PORT: &str = "PLEX_SERVER_PORT";
pub const SETTING_PLEX_TOKEN: &str = "PLEX_TOKEN";
pub const SETTING_USE_SSL: &str = "USE_SSL";
pub const SETTING_IGNORE_SSL_ERRORS: &str = "IGNORE_SSL_ERRORS";
pub const SETTING_REFRESH_INTERVAL: &str = "PLEXGUARD_REFRESH_INTERVAL";
pub const SETTING_DEFAULT_BLOCK: &str = "PLEX_GUARD_DEFAULT_BLOCK";
pub const SETTING_STRICT_MODE: &str = "STRICT_MODE";
pub const SETTING_CONCURRENT_STREAM_LIMIT: &str = "CONCURRENT_STREAM_LIMIT";
pub const SETTING_CONCURRENT_LIMIT_INCLUDE_TEMP_ACCESS: &str =
    "CONCURRENT_LIMIT_INCLUDE_TEMP_ACCESS";
pub const SETTING_DEVICE_CLEANUP_ENABLED: &str = "DEVICE_CLEANUP_ENABLED";
pub const SETTING_DEVICE_CLEANUP_INTERVAL_DAYS: &str = "DEVICE_CLEANUP_INTERVAL_DAYS";
pub const SETTING_TIMEZONE: &str = "TIMEZONE";
pub const SETTING_MSG_DEVICE_PENDING: &str = "MSG_DEVICE_PENDING";
pub const SETTING_MSG_DEVICE_REJECTED: &str = "MSG_DEVICE_REJECTED";
pub const SETTING_MSG_TIME_RESTRICTED: &str = "MSG_TIME_RESTRICTED";
pub const SETTING_MSG_CONCURRENT_LIMIT: &str = "MSG_CONCURRENT_LIMIT";
pub const SETTING_MSG_IP_LAN_ONLY: &str = "MSG_IP_LAN_ONLY";
pub const SETTING_MSG_IP_WAN_ONLY: &str = "MSG_IP_WAN_ONLY";
pub const SETTING_MSG_IP_NOT_ALLOWED: &str = "MSG_IP_NOT_ALLOWED";

// Default reason texts (spec §6, administrator-configurable)
pub const DEFAULT_MSG_DEVICE_PENDING: &str =
    "This device is awaiting administrator approval.";
pub const DEFAULT_MSG_DEVICE_REJECTED: &str = "This device has been blocked by an administrator.";
pub const DEFAULT_MSG_TIME_RESTRICTED: &str =
    "Streaming is not permitted for this device at this time.";
pub const DEFAULT_MSG_CONCURRENT_LIMIT: &str =
    "Too many simultaneous streams for this account.";
pub const DEFAULT_MSG_IP_LAN_ONLY: &str = "This account may only stream from the home network.";
pub const DEFAULT_MSG_IP_WAN_ONLY: &str = "This account may only stream remotely.";
pub const DEFAULT_MSG_IP_NOT_ALLOWED: &str = "This network is not on the allowed list.";

// Validation
pub const MAX_DEVICE_NAME_LEN: usize = 255;
pub const MAX_NOTE_LEN: usize = 2000;
pub const MAX_RULE_NAME_LEN: usize = 120;
