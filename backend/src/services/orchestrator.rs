use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{Datelike, FixedOffset, Utc};
use plexguard_shared::{CoreEvent, StopCode};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::repositories::{TimeRuleRepository, UserPreferenceRepository};
use crate::services::config_store::ConfigStore;
use crate::services::event_bus::EventBus;
use crate::services::history::SessionHistoryWriter;
use crate::services::policy::{self, concurrent, Decision, PolicyContext, PolicySettings};
use crate::services::registry::{normalize_user_id, DeviceRegistry};
use crate::services::upstream::{SessionSnapshot, UpstreamClient};

/// Sequences one full tick: fetch, ingest, history reconcile, evaluate,
/// terminate, publish (spec §4.4). Every step swallows and logs its own
/// errors per spec §7's disposition table; no single session or policy
/// failure is allowed to prevent the others from running.
pub struct SessionOrchestrator {
    upstream: Arc<UpstreamClient>,
    registry: Arc<DeviceRegistry>,
    history: Arc<SessionHistoryWriter>,
    config: Arc<ConfigStore>,
    time_rules: TimeRuleRepository,
    user_preferences: UserPreferenceRepository,
    event_bus: EventBus,
    latest_snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl SessionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upstream: Arc<UpstreamClient>,
        registry: Arc<DeviceRegistry>,
        history: Arc<SessionHistoryWriter>,
        config: Arc<ConfigStore>,
        time_rules: TimeRuleRepository,
        user_preferences: UserPreferenceRepository,
        event_bus: EventBus,
        latest_snapshot: Arc<RwLock<SessionSnapshot>>,
    ) -> Self {
        Self { upstream, registry, history, config, time_rules, user_preferences, event_bus, latest_snapshot }
    }

    pub async fn tick(&self) {
        let snapshot = match self.upstream.fetch_sessions().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "transient upstream error fetching sessions, skipping tick");
                return;
            }
        };

        *self.latest_snapshot.write().await = snapshot.clone();

        let ingest_events = self.registry.ingest(&snapshot).await;
        for event in ingest_events {
            self.event_bus.publish(event).await;
        }

        let history_outcome = match self.history.reconcile(&snapshot).await {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(%error, "fatal error reconciling session history, skipping tick");
                return;
            }
        };

        for session in &snapshot.sessions {
            if history_outcome.newly_started.contains(&session.session_key) {
                if let Err(error) = self.registry.mark_session_started(&session.user.id, &session.player.machine_id).await {
                    warn!(session_key = %session.session_key, %error, "failed to bump session_count for newly started session");
                }
            }
        }

        let settings = self.load_policy_settings().await;
        let offset = parse_fixed_offset(&self.config.get_string(plexguard_shared::SETTING_TIMEZONE, "+00:00").await);
        let now_local = Utc::now().with_timezone(&offset);
        let day_of_week = now_local.weekday().num_days_from_sunday() as plexguard_shared::DayOfWeek;
        let wall_clock_hhmm = now_local.format("%H:%M").to_string();

        let global_limit = self.config.get_int(plexguard_shared::SETTING_CONCURRENT_STREAM_LIMIT, 0).await;
        let include_temp_access = self.config.get_bool(plexguard_shared::SETTING_CONCURRENT_LIMIT_INCLUDE_TEMP_ACCESS, false).await;

        let mut preference_cache = HashMap::new();
        let mut device_cache = HashMap::new();
        for session in &snapshot.sessions {
            let user_id = normalize_user_id(&session.user.id);
            if !preference_cache.contains_key(&user_id) {
                match self.user_preferences.find_or_default(&user_id).await {
                    Ok(preference) => {
                        preference_cache.insert(user_id.clone(), preference);
                    }
                    Err(error) => warn!(user_id, %error, "failed to load user preference, skipping session"),
                }
            }
            let device_key = (user_id.clone(), session.player.machine_id.clone());
            if !device_cache.contains_key(&device_key) {
                match self.registry.get(&user_id, &session.player.machine_id).await {
                    Ok(device) => {
                        device_cache.insert(device_key, device);
                    }
                    Err(error) => warn!(user_id, %error, "failed to load device, skipping session"),
                }
            }
        }

        let countable: Vec<concurrent::CountableInput> = snapshot
            .sessions
            .iter()
            .filter_map(|session| {
                let user_id = normalize_user_id(&session.user.id);
                let device = device_cache.get(&(user_id.clone(), session.player.machine_id.clone()))?.as_ref();
                Some(concurrent::CountableInput {
                    user_id,
                    session_id: session.session_id.clone(),
                    session_key: session.session_key.clone(),
                    started_at: history_outcome.started_at_by_key.get(&session.session_key).copied().unwrap_or_else(Utc::now),
                    is_plexamp: session.player.product.as_deref() == Some("Plexamp"),
                    exclude_from_concurrent_limit: device.map(|d| d.exclude_from_concurrent_limit).unwrap_or(false),
                    has_active_temp_grant: device.map(|d| self.registry.is_temp_access_valid(d)).unwrap_or(false),
                })
            })
            .collect();

        let cap_selected = concurrent::select_for_termination(
            &countable,
            |user_id| preference_cache.get(user_id).and_then(|p| p.concurrent_stream_limit).map(i64::from),
            global_limit,
            include_temp_access,
        );

        let mut to_terminate: Vec<(String, String, String, StopCode)> = Vec::new();

        for session in &snapshot.sessions {
            let user_id = normalize_user_id(&session.user.id);

            if cap_selected.contains(&session.session_id) {
                to_terminate.push((
                    session.session_id.clone(),
                    session.session_key.clone(),
                    settings.msg_concurrent_limit.clone(),
                    StopCode::ConcurrentLimit,
                ));
                continue;
            }

            let Some(preference) = preference_cache.get(&user_id) else { continue };
            let device = device_cache.get(&(user_id.clone(), session.player.machine_id.clone())).and_then(|d| d.as_ref());

            let rules = match self.time_rules.for_user(&user_id).await {
                Ok(rules) => rules,
                Err(error) => {
                    warn!(user_id, %error, "failed to load time rules, treating as none");
                    Vec::new()
                }
            };

            let ctx = PolicyContext {
                session,
                device,
                preference,
                time_rules: &rules,
                settings: &settings,
                day_of_week,
                wall_clock_hhmm: wall_clock_hhmm.clone(),
            };

            let decision = match std::panic::catch_unwind(AssertUnwindSafe(|| policy::evaluate_session(&ctx))) {
                Ok(decision) => decision,
                Err(_) => {
                    error!(session_key = %session.session_key, "per-session policy evaluation panicked, failing open");
                    Decision::Allow
                }
            };

            if let Decision::Block { reason, stop_code } = decision {
                to_terminate.push((session.session_id.clone(), session.session_key.clone(), reason, stop_code));
            }
        }

        let mut already_terminated = HashSet::new();
        for (session_id, session_key, reason, stop_code) in to_terminate {
            if !already_terminated.insert(session_id.clone()) {
                continue;
            }

            let session = snapshot.sessions.iter().find(|s| s.session_id == session_id);
            let Some(session) = session else { continue };
            let user_id = normalize_user_id(&session.user.id);

            match self.upstream.terminate_session(&session_id, &reason).await {
                Ok(()) => {
                    info!(session_id, stop_code = %stop_code, "terminated session");
                    if let Err(error) = self.history.close_for_termination(&session_key, stop_code.as_str(), &reason).await {
                        warn!(session_key, %error, "failed to record termination in session history");
                    }
                    self.event_bus
                        .publish(CoreEvent::StreamBlocked {
                            user_id,
                            device_identifier: session.player.machine_id.clone(),
                            session_key,
                            stop_code: stop_code.as_str().to_string(),
                            ip: session.player.address.clone(),
                            at: Utc::now(),
                        })
                        .await;
                }
                Err(error) => {
                    warn!(session_id, %error, "failed to terminate session, will re-evaluate next tick");
                }
            }
        }
    }

    async fn load_policy_settings(&self) -> PolicySettings {
        PolicySettings {
            default_block: self.config.get_bool(plexguard_shared::SETTING_DEFAULT_BLOCK, false).await,
            msg_device_pending: self
                .config
                .get_string(plexguard_shared::SETTING_MSG_DEVICE_PENDING, plexguard_shared::DEFAULT_MSG_DEVICE_PENDING)
                .await,
            msg_device_rejected: self
                .config
                .get_string(plexguard_shared::SETTING_MSG_DEVICE_REJECTED, plexguard_shared::DEFAULT_MSG_DEVICE_REJECTED)
                .await,
            msg_time_restricted: self
                .config
                .get_string(plexguard_shared::SETTING_MSG_TIME_RESTRICTED, plexguard_shared::DEFAULT_MSG_TIME_RESTRICTED)
                .await,
            msg_concurrent_limit: self
                .config
                .get_string(plexguard_shared::SETTING_MSG_CONCURRENT_LIMIT, plexguard_shared::DEFAULT_MSG_CONCURRENT_LIMIT)
                .await,
            msg_ip_lan_only: self
                .config
                .get_string(plexguard_shared::SETTING_MSG_IP_LAN_ONLY, plexguard_shared::DEFAULT_MSG_IP_LAN_ONLY)
                .await,
            msg_ip_wan_only: self
                .config
                .get_string(plexguard_shared::SETTING_MSG_IP_WAN_ONLY, plexguard_shared::DEFAULT_MSG_IP_WAN_ONLY)
                .await,
            msg_ip_not_allowed: self
                .config
                .get_string(plexguard_shared::SETTING_MSG_IP_NOT_ALLOWED, plexguard_shared::DEFAULT_MSG_IP_NOT_ALLOWED)
                .await,
        }
    }
}

fn parse_fixed_offset(value: &str) -> FixedOffset {
    if value.len() < 2 {
        return FixedOffset::east_opt(0).unwrap();
    }
    let (sign, rest) = value.split_at(1);
    let mut parts = rest.split(':');
    let hours: i32 = parts.next().and_then(|h| h.parse().ok()).unwrap_or(0);
    let minutes: i32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    let total_seconds = (hours * 3600 + minutes * 60) * if sign == "-" { -1 } else { 1 };
    FixedOffset::east_opt(total_seconds).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_and_negative_offsets() {
        assert_eq!(parse_fixed_offset("+00:00").local_minus_utc(), 0);
        assert_eq!(parse_fixed_offset("+05:30").local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(parse_fixed_offset("-04:00").local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn falls_back_to_utc_on_malformed_input() {
        assert_eq!(parse_fixed_offset("garbage").local_minus_utc(), 0);
    }
}
