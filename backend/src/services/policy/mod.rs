pub mod concurrent;
pub mod decision;
pub mod network;
pub mod time_rules;

pub use decision::{Decision, PolicySettings};

use std::net::IpAddr;
use std::str::FromStr;

use plexguard_shared::{DayOfWeek, DeviceStatus, IpAccessPolicy, NetworkPolicy, StopCode};

use crate::models::{Device, TimeRule, UserPreference};
use crate::services::upstream::RawSession;

/// Everything `evaluate_session` needs, already resolved from the registry/
/// preferences/rules/settings at a single point in time - this keeps the
/// function itself a pure evaluator with no I/O (spec §4.3).
pub struct PolicyContext<'a> {
    pub session: &'a RawSession,
    pub device: Option<&'a Device>,
    pub preference: &'a UserPreference,
    /// Enabled rules for this session's user, any device.
    pub time_rules: &'a [TimeRule],
    pub settings: &'a PolicySettings,
    pub day_of_week: DayOfWeek,
    pub wall_clock_hhmm: String,
}

/// Evaluates steps 1-5 of spec §4.3.1 for a single session. The concurrent-
/// stream cap (step 6) is resolved separately, across the whole snapshot,
/// by `concurrent::select_for_termination` before this function ever runs -
/// sessions it selects are never passed through here.
pub fn evaluate_session(ctx: &PolicyContext<'_>) -> Decision {
    // 1. Product bypass.
    if ctx.session.player.product.as_deref() == Some("Plexamp") {
        return Decision::Allow;
    }

    let temp_active = ctx.device.map(is_temp_access_active).unwrap_or(false);
    let temp_bypasses = temp_active && ctx.device.map(|d| d.temp_access_bypass_policies).unwrap_or(false);

    // 2. Temporary access with bypass.
    if temp_bypasses {
        return Decision::Allow;
    }

    // 3. IP policy.
    if let Some(decision) = evaluate_ip_policy(ctx) {
        return decision;
    }

    // 4. Time policy.
    if time_rules::is_blocked(ctx.time_rules, &ctx.session.player.machine_id, ctx.day_of_week, &ctx.wall_clock_hhmm) {
        return Decision::block(ctx.settings.msg_time_restricted.clone(), StopCode::TimeRestricted);
    }

    // 5. Device approval.
    match ctx.device.map(|d| d.status) {
        Some(DeviceStatus::Rejected) => {
            if temp_active {
                Decision::Allow
            } else {
                Decision::block(ctx.settings.msg_device_rejected.clone(), StopCode::DeviceRejected)
            }
        }
        Some(DeviceStatus::Approved) => Decision::Allow,
        Some(DeviceStatus::Pending) | None => {
            if temp_active {
                return Decision::Allow;
            }
            let effective_default_block = ctx.preference.default_block.unwrap_or(ctx.settings.default_block);
            if effective_default_block {
                Decision::block(ctx.settings.msg_device_pending.clone(), StopCode::DevicePending)
            } else {
                Decision::Allow
            }
        }
    }
}

fn evaluate_ip_policy(ctx: &PolicyContext<'_>) -> Option<Decision> {
    let addr: IpAddr = IpAddr::from_str(&ctx.session.player.address).ok()?;
    let location = network::classify(addr);

    match ctx.preference.network_policy {
        NetworkPolicy::Lan if location != plexguard_shared::SessionLocation::Lan => {
            return Some(Decision::block(ctx.settings.msg_ip_lan_only.clone(), StopCode::LanOnly));
        }
        NetworkPolicy::Wan if location != plexguard_shared::SessionLocation::Wan => {
            return Some(Decision::block(ctx.settings.msg_ip_wan_only.clone(), StopCode::WanOnly));
        }
        _ => {}
    }

    if ctx.preference.ip_access_policy == IpAccessPolicy::Restricted
        && !network::allow_list_contains(&ctx.preference.allowed_ips, addr)
    {
        return Some(Decision::block(ctx.settings.msg_ip_not_allowed.clone(), StopCode::IpNotAllowed));
    }

    None
}

fn is_temp_access_active(device: &Device) -> bool {
    device.temp_access_until.map(|until| until > chrono::Utc::now()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::upstream::{SessionContent, SessionMedia, SessionPlayer, SessionUser};
    use chrono::Utc;

    fn settings() -> PolicySettings {
        PolicySettings {
            default_block: true,
            msg_device_pending: "pending".into(),
            msg_device_rejected: "rejected".into(),
            msg_time_restricted: "time".into(),
            msg_concurrent_limit: "concurrent".into(),
            msg_ip_lan_only: "lan only".into(),
            msg_ip_wan_only: "wan only".into(),
            msg_ip_not_allowed: "ip not allowed".into(),
        }
    }

    fn session(address: &str, product: Option<&str>) -> RawSession {
        RawSession {
            session_key: "k1".into(),
            session_id: "s1".into(),
            user: SessionUser { id: "42".into(), name: "alice".into(), thumb: None },
            player: SessionPlayer {
                machine_id: "AAA".into(),
                platform: None,
                product: product.map(str::to_string),
                version: None,
                address: address.into(),
                state: None,
                title: None,
            },
            media: SessionMedia::default(),
            content: SessionContent::default(),
        }
    }

    fn preference() -> UserPreference {
        UserPreference {
            user_id: "42".into(),
            username: None,
            avatar_url: None,
            hidden: false,
            default_block: None,
            network_policy: NetworkPolicy::Both,
            ip_access_policy: IpAccessPolicy::All,
            allowed_ips: Vec::new(),
            concurrent_stream_limit: None,
        }
    }

    fn device(status: DeviceStatus) -> Device {
        Device {
            id: 1,
            user_id: "42".into(),
            device_identifier: "AAA".into(),
            name: "AAA".into(),
            platform: None,
            product: None,
            version: None,
            status,
            exclude_from_concurrent_limit: false,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            last_ip: None,
            session_count: 0,
            temp_access_until: None,
            temp_access_bypass_policies: false,
            temp_access_granted_at: None,
            temp_access_duration_minutes: None,
            note_description: None,
            note_submitted_at: None,
            note_read_at: None,
        }
    }

    #[test]
    fn plexamp_is_always_allowed() {
        let session = session("203.0.113.5", Some("Plexamp"));
        let preference = preference();
        let settings = settings();
        let ctx = PolicyContext {
            session: &session,
            device: None,
            preference: &preference,
            time_rules: &[],
            settings: &settings,
            day_of_week: 3,
            wall_clock_hhmm: "21:00".into(),
        };
        assert_eq!(evaluate_session(&ctx), Decision::Allow);
    }

    #[test]
    fn pending_device_blocked_by_global_default() {
        let session = session("203.0.113.5", Some("Plex Web"));
        let preference = preference();
        let settings = settings();
        let ctx = PolicyContext {
            session: &session,
            device: None,
            preference: &preference,
            time_rules: &[],
            settings: &settings,
            day_of_week: 3,
            wall_clock_hhmm: "21:00".into(),
        };
        assert_eq!(evaluate_session(&ctx), Decision::block("pending", plexguard_shared::StopCode::DevicePending));
    }

    #[test]
    fn approved_device_passes() {
        let session = session("203.0.113.5", Some("Plex Web"));
        let preference = preference();
        let settings = settings();
        let device = device(DeviceStatus::Approved);
        let ctx = PolicyContext {
            session: &session,
            device: Some(&device),
            preference: &preference,
            time_rules: &[],
            settings: &settings,
            day_of_week: 3,
            wall_clock_hhmm: "21:00".into(),
        };
        assert_eq!(evaluate_session(&ctx), Decision::Allow);
    }

    #[test]
    fn lan_only_violation_blocks_a_wan_session() {
        let session = session("198.51.100.7", Some("Plex Web"));
        let mut preference = preference();
        preference.network_policy = NetworkPolicy::Lan;
        let settings = settings();
        let device = device(DeviceStatus::Approved);
        let ctx = PolicyContext {
            session: &session,
            device: Some(&device),
            preference: &preference,
            time_rules: &[],
            settings: &settings,
            day_of_week: 3,
            wall_clock_hhmm: "21:00".into(),
        };
        assert_eq!(evaluate_session(&ctx), Decision::block("lan only", plexguard_shared::StopCode::LanOnly));
    }

    #[test]
    fn temp_access_with_bypass_overrides_a_rejected_lan_violation() {
        let session = session("198.51.100.7", Some("Plex Web"));
        let mut preference = preference();
        preference.network_policy = NetworkPolicy::Lan;
        let settings = settings();
        let mut device = device(DeviceStatus::Rejected);
        device.temp_access_until = Some(Utc::now() + chrono::Duration::hours(1));
        device.temp_access_bypass_policies = true;
        let ctx = PolicyContext {
            session: &session,
            device: Some(&device),
            preference: &preference,
            time_rules: &[],
            settings: &settings,
            day_of_week: 3,
            wall_clock_hhmm: "21:00".into(),
        };
        assert_eq!(evaluate_session(&ctx), Decision::Allow);
    }

    #[test]
    fn expired_temp_access_no_longer_allows() {
        let session = session("203.0.113.5", Some("Plex Web"));
        let preference = preference();
        let settings = settings();
        let mut device = device(DeviceStatus::Rejected);
        device.temp_access_until = Some(Utc::now() - chrono::Duration::minutes(1));
        let ctx = PolicyContext {
            session: &session,
            device: Some(&device),
            preference: &preference,
            time_rules: &[],
            settings: &settings,
            day_of_week: 3,
            wall_clock_hhmm: "21:00".into(),
        };
        assert_eq!(evaluate_session(&ctx), Decision::block("rejected", plexguard_shared::StopCode::DeviceRejected));
    }
}
