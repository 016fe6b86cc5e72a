use plexguard_shared::StopCode;

/// The outcome of evaluating one session against the policy stack (spec
/// §4.3). `reason` is the human-readable text surfaced to the end user via
/// the upstream `terminate` call; `stop_code` never leaves the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Block { reason: String, stop_code: StopCode },
}

impl Decision {
    pub fn block(reason: impl Into<String>, stop_code: StopCode) -> Self {
        Decision::Block { reason: reason.into(), stop_code }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Resolved global settings the policy engine needs, read once per tick
/// through the `ConfigStore` and passed in so evaluation itself stays
/// synchronous and I/O-free.
#[derive(Debug, Clone)]
pub struct PolicySettings {
    pub default_block: bool,
    pub msg_device_pending: String,
    pub msg_device_rejected: String,
    pub msg_time_restricted: String,
    pub msg_concurrent_limit: String,
    pub msg_ip_lan_only: String,
    pub msg_ip_wan_only: String,
    pub msg_ip_not_allowed: String,
}
