use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::services::config_store::ConfigStore;
use crate::services::orchestrator::SessionOrchestrator;

/// Drives the orchestrator on a configurable interval (spec §4.5).
/// `PLEXGUARD_REFRESH_INTERVAL` is re-read from the config store every
/// iteration, clamped to a 1s minimum, so a runtime change takes effect on
/// the next tick without restarting the loop.
pub struct PollScheduler {
    orchestrator: Arc<SessionOrchestrator>,
    config: Arc<ConfigStore>,
}

impl PollScheduler {
    pub fn new(orchestrator: Arc<SessionOrchestrator>, config: Arc<ConfigStore>) -> Self {
        Self { orchestrator, config }
    }

    /// Runs until `shutdown` reports `true`. An in-flight tick always
    /// finishes before the loop exits.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("poll scheduler starting");

        loop {
            let interval_secs = self
                .config
                .get_int(plexguard_shared::SETTING_REFRESH_INTERVAL, plexguard_shared::DEFAULT_REFRESH_INTERVAL_SECS as i64)
                .await
                .max(plexguard_shared::MIN_REFRESH_INTERVAL_SECS as i64) as u64;

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(interval_secs)) => {
                    self.orchestrator.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("poll scheduler received shutdown signal, exiting");
                        break;
                    }
                }
            }
        }
    }
}
