use actix_web::{web, HttpResponse};
use chrono::Utc;
use plexguard_shared::{
    DeviceIdPath, DeviceResponse, GrantTempAccessRequest, PageQuery, PaginatedResponse, UpdateDeviceRequest,
};
use validator::Validate;

use crate::error::AppError;
use crate::models::Device;
use crate::repositories::PaginationParams;
use crate::state::AppState;

pub(crate) fn device_to_response(device: Device) -> DeviceResponse {
    DeviceResponse {
        id: device.id,
        user_id: device.user_id,
        device_identifier: device.device_identifier,
        name: device.name,
        platform: device.platform,
        product: device.product,
        version: device.version,
        status: device.status,
        exclude_from_concurrent_limit: device.exclude_from_concurrent_limit,
        first_seen: device.first_seen,
        last_seen: device.last_seen,
        last_ip: device.last_ip.map(|ip| ip.to_string()),
        session_count: device.session_count,
        temp_access_until: device.temp_access_until,
        temp_access_bypass_policies: device.temp_access_bypass_policies,
        temp_access_granted_at: device.temp_access_granted_at,
        temp_access_duration_minutes: device.temp_access_duration_minutes,
        note_description: device.note_description,
        note_submitted_at: device.note_submitted_at,
        note_read_at: device.note_read_at,
    }
}

pub async fn list_devices(state: web::Data<AppState>, query: web::Query<PageQuery>) -> Result<HttpResponse, AppError> {
    let pagination = PaginationParams::new(query.limit, query.offset);
    let page = state.repositories.devices.list_all(pagination).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: page.data.into_iter().map(device_to_response).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
        has_more: page.has_more(),
    }))
}

pub async fn update_device(
    state: web::Data<AppState>,
    path: web::Path<DeviceIdPath>,
    body: web::Json<UpdateDeviceRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let device = state
        .repositories
        .devices
        .update(path.id, body.name.as_deref(), body.status, body.exclude_from_concurrent_limit)
        .await?;

    Ok(HttpResponse::Ok().json(device_to_response(device)))
}

pub async fn grant_temp_access(
    state: web::Data<AppState>,
    path: web::Path<DeviceIdPath>,
    body: web::Json<GrantTempAccessRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now();
    let until = now + chrono::Duration::minutes(body.duration_minutes);
    let duration_minutes = i32::try_from(body.duration_minutes).map_err(|_| AppError::Validation("duration_minutes out of range".to_string()))?;
    let device = state
        .repositories
        .devices
        .grant_temp_access(path.id, until, body.bypass_policies, now, duration_minutes)
        .await?;

    Ok(HttpResponse::Ok().json(device_to_response(device)))
}

pub async fn revoke_temp_access(state: web::Data<AppState>, path: web::Path<DeviceIdPath>) -> Result<HttpResponse, AppError> {
    let device = state.repositories.devices.revoke_temp_access(path.id).await?;
    Ok(HttpResponse::Ok().json(device_to_response(device)))
}

pub async fn mark_note_read(state: web::Data<AppState>, path: web::Path<DeviceIdPath>) -> Result<HttpResponse, AppError> {
    state.repositories.devices.mark_note_read(path.id, Utc::now()).await?;
    let device = state
        .repositories
        .devices
        .find_by_id(path.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("device {} not found", path.id)))?;
    Ok(HttpResponse::Ok().json(device_to_response(device)))
}
