use actix_web::{web, HttpResponse};
use chrono::Utc;
use plexguard_shared::{CoreEvent, DeviceIdPath, SettingResponse, SubmitDeviceNoteRequest};
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::services::registry::normalize_user_id;
use crate::state::AppState;

use super::devices::device_to_response;
use super::rules::rule_to_response;

/// Devices the caller owns, identically shaped to the admin response - the
/// portal surface only ever restricts *which* rows are visible, not their shape.
pub async fn list_my_devices(state: web::Data<AppState>, principal: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
    let user_id = normalize_user_id(&principal.0.id);
    let devices = state.registry.list_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(devices.into_iter().map(device_to_response).collect::<Vec<_>>()))
}

pub async fn list_my_rules(state: web::Data<AppState>, principal: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
    let user_id = normalize_user_id(&principal.0.id);
    let rules = state.repositories.time_rules.list_for_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(rules.into_iter().map(rule_to_response).collect::<Vec<_>>()))
}

/// Public, non-private settings only - the portal surface never sees an
/// admin-only configuration value (spec §6).
pub async fn list_public_settings(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let settings = state.repositories.settings.list_all().await?;
    let visible: Vec<SettingResponse> = settings
        .into_iter()
        .filter(|s| !s.private)
        .map(|s| SettingResponse { key: s.key, value: s.value, kind: s.kind, private: s.private })
        .collect();
    Ok(HttpResponse::Ok().json(visible))
}

/// One-time note a portal user attaches to one of their own pending/rejected
/// devices, asking an admin to reconsider it.
pub async fn submit_device_note(
    state: web::Data<AppState>,
    principal: AuthenticatedPrincipal,
    path: web::Path<DeviceIdPath>,
    body: web::Json<SubmitDeviceNoteRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let device = state
        .repositories
        .devices
        .find_by_id(path.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("device {} not found", path.id)))?;

    let user_id = normalize_user_id(&principal.0.id);
    if device.user_id != user_id {
        return Err(AppError::Authorization("device belongs to a different user".to_string()));
    }

    if device.note_submitted_at.is_some() {
        return Err(AppError::Conflict("a note has already been submitted for this device".to_string()));
    }

    let updated = state.repositories.devices.submit_note(path.id, &body.description, Utc::now()).await?;

    state
        .event_bus
        .publish(CoreEvent::DeviceNoteSubmitted {
            user_id: updated.user_id.clone(),
            device_identifier: updated.device_identifier.clone(),
            at: Utc::now(),
        })
        .await;

    Ok(HttpResponse::Ok().json(device_to_response(updated)))
}
