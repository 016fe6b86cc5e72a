use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::state::AppState;

/// Process liveness - never touches the database.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Additionally probes the database pool (spec §7's "health endpoint
/// reports unhealthy" requirement for the fatal-error row).
pub async fn health_ready(state: web::Data<AppState>) -> HttpResponse {
    let health = state.database.health_check().await;
    let body = json!({
        "is_healthy": health.is_healthy,
        "response_time_ms": health.response_time.as_millis(),
        "pool_size": health.pool_size,
        "idle_connections": health.idle_connections,
        "error": health.error,
    });

    if health.is_healthy {
        HttpResponse::Ok().json(json!({ "status": "ok", "database": body }))
    } else {
        HttpResponse::ServiceUnavailable().json(json!({ "status": "unhealthy", "database": body }))
    }
}
