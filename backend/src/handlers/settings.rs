use actix_web::{web, HttpResponse};
use plexguard_shared::{SettingResponse, UpdateSettingRequest};
use validator::Validate;

use crate::error::AppError;
use crate::models::Setting;
use crate::state::AppState;

fn to_response(setting: Setting) -> SettingResponse {
    SettingResponse { key: setting.key, value: setting.value, kind: setting.kind, private: setting.private }
}

/// Private settings never leave the process (spec §6) - the admin UI has no
/// use for them and the portal surface must never see them at all.
pub async fn list_settings(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let settings = state.repositories.settings.list_all().await?;
    let visible: Vec<SettingResponse> = settings.into_iter().filter(|s| !s.private).map(to_response).collect();
    Ok(HttpResponse::Ok().json(visible))
}

pub async fn update_setting(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateSettingRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let key = path.into_inner();

    let current = state
        .repositories
        .settings
        .find(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("setting {key} not found")))?;

    state.config.set(&key, body.value.clone(), current.kind, current.private).await?;

    let updated = state
        .repositories
        .settings
        .find(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("setting {key} not found")))?;

    Ok(HttpResponse::Ok().json(to_response(updated)))
}
