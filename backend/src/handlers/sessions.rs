use std::net::IpAddr;
use std::str::FromStr;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use plexguard_shared::{CoreEvent, SessionLocation, SessionView, TerminateSessionRequest};
use validator::Validate;

use crate::error::AppError;
use crate::services::policy::network;
use crate::services::upstream::RawSession;
use crate::state::AppState;

async fn to_view(state: &AppState, session: &RawSession) -> SessionView {
    let session_count = state
        .registry
        .get(&session.user.id, &session.player.machine_id)
        .await
        .ok()
        .flatten()
        .map(|device| device.session_count)
        .unwrap_or(0);

    let location = IpAddr::from_str(&session.player.address).map(network::classify).unwrap_or(SessionLocation::Wan);

    SessionView {
        session_key: session.session_key.clone(),
        session_id: session.session_id.clone(),
        user_id: session.user.id.clone(),
        username: session.user.name.clone(),
        device_identifier: session.player.machine_id.clone(),
        device_name: session.player.title.clone().unwrap_or_else(|| session.player.machine_id.clone()),
        platform: session.player.platform.clone(),
        product: session.player.product.clone(),
        address: session.player.address.clone(),
        location,
        title: session.content.title.clone().unwrap_or_default(),
        grandparent_title: session.content.grandparent_title.clone(),
        session_count,
    }
}

pub async fn list_sessions(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let snapshot = state.latest_snapshot.read().await;
    let mut views = Vec::with_capacity(snapshot.sessions.len());
    for session in &snapshot.sessions {
        views.push(to_view(&state, session).await);
    }
    Ok(HttpResponse::Ok().json(views))
}

pub async fn terminate_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<TerminateSessionRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let session_id = path.into_inner();

    let snapshot = state.latest_snapshot.read().await;
    let session = snapshot
        .sessions
        .iter()
        .find(|s| s.session_id == session_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("session {session_id} not found")))?;
    drop(snapshot);

    state.upstream.terminate_session(&session_id, &body.reason).await?;
    state.history.close_for_termination(&session.session_key, "ADMIN_TERMINATED", &body.reason).await?;

    state
        .event_bus
        .publish(CoreEvent::StreamBlocked {
            user_id: session.user.id.clone(),
            device_identifier: session.player.machine_id.clone(),
            session_key: session.session_key.clone(),
            stop_code: "ADMIN_TERMINATED".to_string(),
            ip: session.player.address.clone(),
            at: Utc::now(),
        })
        .await;

    Ok(HttpResponse::Ok().finish())
}
