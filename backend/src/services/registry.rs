use std::str::FromStr;

use chrono::Utc;
use ipnetwork::IpNetwork;
use plexguard_shared::{CoreEvent, DeviceStatus, DEFAULT_RETURNED_DEVICE_THRESHOLD_HOURS};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::Device;
use crate::repositories::{DeviceRepository, UserPreferenceRepository};
use crate::services::config_store::ConfigStore;
use crate::services::upstream::SessionSnapshot;

/// Materializes `Device`/`UserPreference` rows from observed sessions
/// (spec §4.2). The registry is the sole owner of `Device` mutation; the
/// policy engine only reads what this produces.
pub struct DeviceRegistry {
    devices: DeviceRepository,
    user_preferences: UserPreferenceRepository,
    config: std::sync::Arc<ConfigStore>,
}

impl DeviceRegistry {
    pub fn new(devices: DeviceRepository, user_preferences: UserPreferenceRepository, config: std::sync::Arc<ConfigStore>) -> Self {
        Self { devices, user_preferences, config }
    }

    /// Upserts every session's user and device rows, returning the events
    /// the caller should publish once ingest completes. Per-session errors
    /// are logged with the session key and skipped - ingest never aborts.
    pub async fn ingest(&self, snapshot: &SessionSnapshot) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        for session in &snapshot.sessions {
            if session.user.id.is_empty() || session.player.machine_id.is_empty() {
                debug!(session_key = %session.session_key, "skipping session with no user id or machine id");
                continue;
            }

            match self.ingest_one(session).await {
                Ok(mut session_events) => events.append(&mut session_events),
                Err(error) => {
                    warn!(session_key = %session.session_key, %error, "failed to ingest session, skipping");
                }
            }
        }

        events
    }

    async fn ingest_one(&self, session: &super::upstream::RawSession) -> Result<Vec<CoreEvent>, AppError> {
        let user_id = normalize_user_id(&session.user.id);
        let now = Utc::now();

        let preference = self.user_preferences.find_or_default(&user_id).await?;
        if preference.username.is_none() || preference.avatar_url.is_none() {
            self.user_preferences
                .upsert_identity(
                    &user_id,
                    preference.username.as_deref().or(Some(session.user.name.as_str())),
                    preference.avatar_url.as_deref().or(session.user.thumb.as_deref()),
                )
                .await?;
        }

        let address: IpNetwork = IpNetwork::from_str(&session.player.address)
            .map_err(|_| AppError::Validation(format!("invalid source address: {}", session.player.address)))?;

        let mut events = Vec::new();
        let existing = self.devices.find_by_user_and_identifier(&user_id, &session.player.machine_id).await?;

        if let Some(existing) = &existing {
            if existing.last_ip != Some(address) {
                events.push(CoreEvent::LocationChange {
                    user_id: user_id.clone(),
                    device_identifier: session.player.machine_id.clone(),
                    old_ip: existing.last_ip.map(|ip| ip.to_string()).unwrap_or_default(),
                    new_ip: address.to_string(),
                    at: now,
                });
            }

            let threshold = chrono::Duration::hours(DEFAULT_RETURNED_DEVICE_THRESHOLD_HOURS);
            if now - existing.last_seen > threshold {
                events.push(CoreEvent::ReturnedDevice {
                    user_id: user_id.clone(),
                    device_identifier: session.player.machine_id.clone(),
                    inactive_for_hours: (now - existing.last_seen).num_hours(),
                    at: now,
                });
            }
        }

        let (_device, created) = self
            .devices
            .upsert_seen(
                &user_id,
                &session.player.machine_id,
                session.player.title.as_deref().unwrap_or(&session.player.machine_id),
                session.player.platform.as_deref(),
                session.player.product.as_deref(),
                session.player.version.as_deref(),
                now,
                address,
            )
            .await?;

        if created {
            events.push(CoreEvent::NewDevice { user_id: user_id.clone(), device_identifier: session.player.machine_id.clone(), at: now });

            if self.should_auto_approve_on_first_sight().await {
                let status = if self.config.get_bool(plexguard_shared::SETTING_DEFAULT_BLOCK, false).await {
                    DeviceStatus::Rejected
                } else {
                    DeviceStatus::Approved
                };
                if let Some(device) = self.devices.find_by_user_and_identifier(&user_id, &session.player.machine_id).await? {
                    self.devices.update(device.id, None, Some(status), None).await?;
                }
            }
        }

        Ok(events)
    }

    /// `STRICT_MODE` auto-decides a brand-new device using the
    /// `PLEX_GUARD_DEFAULT_BLOCK` setting (rejected if blocking, otherwise
    /// approved) instead of queuing it as `pending`.
    async fn should_auto_approve_on_first_sight(&self) -> bool {
        self.config.get_bool(plexguard_shared::SETTING_STRICT_MODE, false).await
    }

    /// Bumps `session_count` for a device once the session history writer
    /// has classified a `session_key` as newly started. Kept separate from
    /// `ingest` so the registry's sole ownership of `Device` mutation isn't
    /// entangled with history reconciliation timing.
    pub async fn mark_session_started(&self, user_id: &str, device_identifier: &str) -> Result<(), AppError> {
        let user_id = normalize_user_id(user_id);
        if let Some(device) = self.devices.find_by_user_and_identifier(&user_id, device_identifier).await? {
            self.devices.increment_session_count(device.id).await?;
        }
        Ok(())
    }

    /// Deletes devices inactive past the configured threshold, skipping any
    /// with an unread note or an active temp grant.
    pub async fn cleanup_inactive(&self) -> Result<u64, AppError> {
        if !self.config.get_bool(plexguard_shared::SETTING_DEVICE_CLEANUP_ENABLED, false).await {
            return Ok(0);
        }

        let threshold_days = self
            .config
            .get_int(plexguard_shared::SETTING_DEVICE_CLEANUP_INTERVAL_DAYS, plexguard_shared::DEFAULT_CLEANUP_THRESHOLD_DAYS)
            .await;
        let cutoff = Utc::now() - chrono::Duration::days(threshold_days);

        let stale = self.devices.find_stale(cutoff).await?;
        let mut deleted = 0u64;

        for device in stale {
            if device.note_description.is_some() && device.note_read_at.is_none() {
                continue;
            }
            if is_temp_access_active(&device) {
                continue;
            }
            if self.devices.delete(device.id).await? {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    pub async fn get(&self, user_id: &str, device_identifier: &str) -> Result<Option<Device>, AppError> {
        self.devices.find_by_user_and_identifier(&normalize_user_id(user_id), device_identifier).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Device>, AppError> {
        let page = self.devices.list_for_user(&normalize_user_id(user_id), crate::repositories::PaginationParams::new(None, None)).await?;
        Ok(page.data)
    }

    pub fn is_temp_access_valid(&self, device: &Device) -> bool {
        is_temp_access_active(device)
    }
}

/// Devices and preferences are keyed by a single string representation of
/// the upstream user id (spec §9 open question) - callers must not compare
/// numeric and string forms of the same id without normalizing first.
pub fn normalize_user_id(raw: &str) -> String {
    raw.trim().to_string()
}

fn is_temp_access_active(device: &Device) -> bool {
    device.temp_access_until.map(|until| until > Utc::now()).unwrap_or(false)
}
