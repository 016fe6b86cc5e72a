//! Literal end-to-end scenarios S1-S6 and the cross-cutting testable
//! properties from spec §8, driven directly against the pure policy engine
//! and concurrent-cap algorithm. None of these need a database: both
//! `policy::evaluate_session` and `policy::concurrent::select_for_termination`
//! are pure functions of their arguments (spec §4.3 "Pure evaluator").

use chrono::{DateTime, Utc};

use plexguard::models::{Device, TimeRule, UserPreference};
use plexguard::services::policy::concurrent::{select_for_termination, CountableInput};
use plexguard::services::policy::{evaluate_session, Decision, PolicyContext, PolicySettings};
use plexguard::services::upstream::{RawSession, SessionContent, SessionMedia, SessionPlayer, SessionUser};
use plexguard_shared::{DeviceStatus, IpAccessPolicy, NetworkPolicy, StopCode};

fn settings() -> PolicySettings {
    PolicySettings {
        default_block: false,
        msg_device_pending: "MSG_DEVICE_PENDING".into(),
        msg_device_rejected: "MSG_DEVICE_REJECTED".into(),
        msg_time_restricted: "MSG_TIME_RESTRICTED".into(),
        msg_concurrent_limit: "MSG_CONCURRENT_LIMIT".into(),
        msg_ip_lan_only: "MSG_IP_LAN_ONLY".into(),
        msg_ip_wan_only: "MSG_IP_WAN_ONLY".into(),
        msg_ip_not_allowed: "MSG_IP_NOT_ALLOWED".into(),
    }
}

fn default_preference(user_id: &str) -> UserPreference {
    UserPreference {
        user_id: user_id.into(),
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

fn session(user_id: &str, machine_id: &str, session_id: &str, address: &str, product: Option<&str>) -> RawSession {
    RawSession {
        session_key: format!("key-{session_id}"),
        session_id: session_id.into(),
        user: SessionUser { id: user_id.into(), name: "alice".into(), thumb: None },
        player: SessionPlayer {
            machine_id: machine_id.into(),
            platform: Some("Roku".into()),
            product: product.map(str::to_string),
            version: None,
            address: address.into(),
            state: Some("playing".into()),
            title: Some(machine_id.into()),
        },
        media: SessionMedia::default(),
        content: SessionContent::default(),
    }
}

fn approved_device(user_id: &str, machine_id: &str) -> Device {
    Device {
        id: 1,
        user_id: user_id.into(),
        device_identifier: machine_id.into(),
        name: machine_id.into(),
        platform: None,
        product: None,
        version: None,
        status: DeviceStatus::Approved,
        exclude_from_concurrent_limit: false,
        first_seen: Utc::now(),
        last_seen: Utc::now(),
        last_ip: None,
        session_count: 1,
        temp_access_until: None,
        temp_access_bypass_policies: false,
        temp_access_granted_at: None,
        temp_access_duration_minutes: None,
        note_description: None,
        note_submitted_at: None,
        note_read_at: None,
    }
}

/// S1 - Pending device blocked by global default.
#[test]
fn s1_pending_device_blocked_by_global_default() {
    let mut global_settings = settings();
    global_settings.default_block = true;

    let session = session("42", "AAA", "s1", "203.0.113.5", Some("Plex Web"));
    let preference = default_preference("42");

    let ctx = PolicyContext {
        session: &session,
        device: None, // no row yet - first sighting, registry would insert as pending
        preference: &preference,
        time_rules: &[],
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "12:00".into(),
    };

    match evaluate_session(&ctx) {
        Decision::Block { stop_code, .. } => assert_eq!(stop_code, StopCode::DevicePending),
        Decision::Allow => panic!("expected a pending device to be blocked under global default-block"),
    }
}

/// S2 - Approved device passes.
#[test]
fn s2_approved_device_passes() {
    let global_settings = settings();
    let session = session("42", "AAA", "s1", "203.0.113.5", Some("Plex Web"));
    let preference = default_preference("42");
    let device = approved_device("42", "AAA");

    let ctx = PolicyContext {
        session: &session,
        device: Some(&device),
        preference: &preference,
        time_rules: &[],
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "12:00".into(),
    };

    assert_eq!(evaluate_session(&ctx), Decision::Allow);
}

/// S3 - LAN-only violation.
#[test]
fn s3_lan_only_violation_blocks_a_wan_session() {
    let global_settings = settings();
    let session = session("42", "AAA", "s1", "198.51.100.7", Some("Plex Web"));
    let mut preference = default_preference("42");
    preference.network_policy = NetworkPolicy::Lan;
    let device = approved_device("42", "AAA");

    let ctx = PolicyContext {
        session: &session,
        device: Some(&device),
        preference: &preference,
        time_rules: &[],
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "12:00".into(),
    };

    match evaluate_session(&ctx) {
        Decision::Block { stop_code, .. } => assert_eq!(stop_code, StopCode::LanOnly),
        Decision::Allow => panic!("expected a WAN session to violate a LAN-only policy"),
    }
}

/// S4 - Time rule active (TIMEZONE="+00:00", 21:00 falls inside 20:00-22:00).
#[test]
fn s4_time_rule_active_blocks_the_session() {
    let global_settings = settings();
    let session = session("42", "AAA", "s1", "203.0.113.5", Some("Plex Web"));
    let preference = default_preference("42");
    let device = approved_device("42", "AAA");
    let rule = TimeRule {
        id: 1,
        user_id: "42".into(),
        device_identifier: None,
        day_of_week: 3,
        start_time: "20:00".into(),
        end_time: "22:00".into(),
        enabled: true,
        rule_name: "quiet hours".into(),
    };

    let ctx = PolicyContext {
        session: &session,
        device: Some(&device),
        preference: &preference,
        time_rules: std::slice::from_ref(&rule),
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "21:00".into(),
    };

    match evaluate_session(&ctx) {
        Decision::Block { stop_code, .. } => assert_eq!(stop_code, StopCode::TimeRestricted),
        Decision::Allow => panic!("expected the 21:00 session to fall inside the 20:00-22:00 block window"),
    }
}

/// S5 - Concurrent cap terminates the newest excess session.
#[test]
fn s5_concurrent_cap_terminates_newest() {
    let base: DateTime<Utc> = "2024-01-01T10:00:00Z".parse().unwrap();

    let sessions = vec![
        CountableInput {
            user_id: "42".into(),
            session_id: "s_a".into(),
            session_key: "k_a".into(),
            started_at: base,
            is_plexamp: false,
            exclude_from_concurrent_limit: false,
            has_active_temp_grant: false,
        },
        CountableInput {
            user_id: "42".into(),
            session_id: "s_b".into(),
            session_key: "k_b".into(),
            started_at: base + chrono::Duration::minutes(5),
            is_plexamp: false,
            exclude_from_concurrent_limit: false,
            has_active_temp_grant: false,
        },
        CountableInput {
            user_id: "42".into(),
            session_id: "s_c".into(),
            session_key: "k_c".into(),
            started_at: base + chrono::Duration::minutes(10),
            is_plexamp: false,
            exclude_from_concurrent_limit: false,
            has_active_temp_grant: false,
        },
    ];

    let selected = select_for_termination(&sessions, |_| None, 2, true);

    assert_eq!(selected.len(), 1);
    assert!(selected.contains("s_c"));
    assert!(!selected.contains("s_a"));
    assert!(!selected.contains("s_b"));
}

/// S6 - Temp access with bypass wins over a rejected device and a LAN-only violation.
#[test]
fn s6_temp_access_bypass_overrides_rejected_and_lan_only() {
    let global_settings = settings();
    let session = session("42", "AAA", "s1", "198.51.100.7", Some("Plex Web")); // WAN address
    let mut preference = default_preference("42");
    preference.network_policy = NetworkPolicy::Lan;

    let mut device = approved_device("42", "AAA");
    device.status = DeviceStatus::Rejected;
    device.temp_access_until = Some(Utc::now() + chrono::Duration::hours(1));
    device.temp_access_bypass_policies = true;

    let ctx = PolicyContext {
        session: &session,
        device: Some(&device),
        preference: &preference,
        time_rules: &[],
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "12:00".into(),
    };

    assert_eq!(evaluate_session(&ctx), Decision::Allow);
}

/// Property 7 - Plexamp invariance: always allowed regardless of every other input.
#[test]
fn plexamp_sessions_are_always_allowed_regardless_of_policy() {
    let mut global_settings = settings();
    global_settings.default_block = true;

    let session = session("42", "AAA", "s1", "198.51.100.7", Some("Plexamp"));
    let mut preference = default_preference("42");
    preference.network_policy = NetworkPolicy::Lan;

    let mut device = approved_device("42", "AAA");
    device.status = DeviceStatus::Rejected;

    let rule = TimeRule {
        id: 1,
        user_id: "42".into(),
        device_identifier: None,
        day_of_week: 3,
        start_time: "00:00".into(),
        end_time: "23:59".into(),
        enabled: true,
        rule_name: "always".into(),
    };

    let ctx = PolicyContext {
        session: &session,
        device: Some(&device),
        preference: &preference,
        time_rules: std::slice::from_ref(&rule),
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "12:00".into(),
    };

    assert_eq!(evaluate_session(&ctx), Decision::Allow);
}

/// Property 8 - temp access stops conferring allow the instant it expires.
#[test]
fn temp_access_stops_allowing_the_instant_it_expires() {
    let global_settings = settings();
    let session = session("42", "AAA", "s1", "203.0.113.5", Some("Plex Web"));
    let preference = default_preference("42");

    let mut device = approved_device("42", "AAA");
    device.status = DeviceStatus::Rejected;
    device.temp_access_until = Some(Utc::now() - chrono::Duration::seconds(1));

    let ctx = PolicyContext {
        session: &session,
        device: Some(&device),
        preference: &preference,
        time_rules: &[],
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "12:00".into(),
    };

    match evaluate_session(&ctx) {
        Decision::Block { stop_code, .. } => assert_eq!(stop_code, StopCode::DeviceRejected),
        Decision::Allow => panic!("an expired temp grant must not confer allow"),
    }
}

/// Property 4/5 - determinism and precedence: the same inputs always yield
/// the same decision, and an earlier decisive rule is never overridden by a
/// later one (here, IP policy wins before time policy is even consulted).
#[test]
fn policy_evaluation_is_deterministic_and_ip_precedes_time() {
    let global_settings = settings();
    let session = session("42", "AAA", "s1", "198.51.100.7", Some("Plex Web"));
    let mut preference = default_preference("42");
    preference.network_policy = NetworkPolicy::Lan;
    let device = approved_device("42", "AAA");

    // A time rule that would also block, if ever reached.
    let rule = TimeRule {
        id: 1,
        user_id: "42".into(),
        device_identifier: None,
        day_of_week: 3,
        start_time: "00:00".into(),
        end_time: "23:59".into(),
        enabled: true,
        rule_name: "always".into(),
    };

    let ctx = PolicyContext {
        session: &session,
        device: Some(&device),
        preference: &preference,
        time_rules: std::slice::from_ref(&rule),
        settings: &global_settings,
        day_of_week: 3,
        wall_clock_hhmm: "12:00".into(),
    };

    let first = evaluate_session(&ctx);
    let second = evaluate_session(&ctx);
    assert_eq!(first, second);
    match first {
        Decision::Block { stop_code, .. } => assert_eq!(stop_code, StopCode::LanOnly),
        Decision::Allow => panic!("expected the LAN-only violation to win"),
    }
}
