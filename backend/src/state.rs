use std::sync::Arc;

use tokio::sync::RwLock;

use crate::database::Database;
use crate::repositories::Repositories;
use crate::services::upstream::SessionSnapshot;
use crate::services::{ConfigStore, DeviceRegistry, EventBus, SessionHistoryWriter, UpstreamClient};
use crate::utils::JwtService;

/// Shared application state handed to every HTTP handler via `web::Data`.
/// The same `repositories`/`registry`/`config`/`event_bus` instances are
/// also owned by the poll scheduler's orchestrator, so admin/portal writes
/// and the background tick observe the same database through the same
/// serialized-per-row write path (spec §5).
pub struct AppState {
    pub database: Database,
    pub repositories: Repositories,
    pub registry: Arc<DeviceRegistry>,
    pub config: Arc<ConfigStore>,
    pub event_bus: EventBus,
    pub upstream: Arc<UpstreamClient>,
    pub history: Arc<SessionHistoryWriter>,
    pub jwt: Arc<JwtService>,
    /// Most recent snapshot the poll loop fetched, enriched for the
    /// `GET /sessions` read path without making the HTTP handler hit the
    /// upstream server itself.
    pub latest_snapshot: Arc<RwLock<SessionSnapshot>>,
}
