use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use tracing::warn;

use crate::error::AppError;
use crate::repositories::SessionHistoryRepository;
use crate::services::policy::network;
use crate::services::registry::normalize_user_id;
use crate::services::upstream::SessionSnapshot;

/// Reconciles `session_history` rows against the live snapshot (spec §4.4
/// step 3): opens a row for every `session_key` not already open, and
/// closes rows whose `session_key` has disappeared. Spec treats this as an
/// external collaborator the orchestrator invokes; it lives in-core since
/// nothing else in the spec describes a process boundary for it to sit
/// behind.
pub struct SessionHistoryWriter {
    repository: SessionHistoryRepository,
}

pub struct ReconcileOutcome {
    /// `session_key`s this reconcile pass opened for the first time - the
    /// registry's `session_count` increments exactly once per entry here.
    pub newly_started: HashSet<String>,
    /// `started_at` for every currently open session, keyed by
    /// `session_key`, for the concurrent-cap algorithm to order on.
    pub started_at_by_key: HashMap<String, DateTime<Utc>>,
}

impl SessionHistoryWriter {
    pub fn new(repository: SessionHistoryRepository) -> Self {
        Self { repository }
    }

    pub async fn reconcile(&self, snapshot: &SessionSnapshot) -> Result<ReconcileOutcome, AppError> {
        let now = Utc::now();
        let mut newly_started = HashSet::new();
        let mut started_at_by_key = HashMap::new();
        let mut live_keys = HashSet::new();

        for session in &snapshot.sessions {
            if session.session_key.is_empty() {
                continue;
            }
            live_keys.insert(session.session_key.clone());

            match self.repository.find_open_by_session_key(&session.session_key).await? {
                Some(existing) => {
                    started_at_by_key.insert(session.session_key.clone(), existing.started_at);
                }
                None => {
                    let ip: IpNetwork = IpNetwork::from_str(&session.player.address).unwrap_or_else(|_| "0.0.0.0/32".parse().unwrap());
                    let location = IpAddr::from_str(&session.player.address).map(network::classify).unwrap_or(plexguard_shared::SessionLocation::Wan);

                    let entry = self
                        .repository
                        .start(
                            &session.session_key,
                            &normalize_user_id(&session.user.id),
                            &session.player.machine_id,
                            now,
                            location,
                            ip,
                        )
                        .await?;

                    newly_started.insert(session.session_key.clone());
                    started_at_by_key.insert(session.session_key.clone(), entry.started_at);
                }
            }
        }

        for open in self.repository.find_all_open().await? {
            if !live_keys.contains(&open.session_key) {
                if let Err(error) = self.repository.close(open.id, now, None, None).await {
                    warn!(session_key = %open.session_key, %error, "failed to close stale session history row");
                }
            }
        }

        Ok(ReconcileOutcome { newly_started, started_at_by_key })
    }

    /// Records why a session ended when the orchestrator terminates it
    /// itself, rather than waiting for the next tick's absence-based close.
    pub async fn close_for_termination(&self, session_key: &str, stop_code: &str, reason: &str) -> Result<(), AppError> {
        if let Some(open) = self.repository.find_open_by_session_key(session_key).await? {
            self.repository.close(open.id, Utc::now(), Some(stop_code), Some(reason)).await?;
        }
        Ok(())
    }
}
