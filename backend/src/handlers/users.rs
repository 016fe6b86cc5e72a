use std::str::FromStr;

use actix_web::{web, HttpResponse};
use ipnetwork::IpNetwork;
use plexguard_shared::{
    PageQuery, PaginatedResponse, UpdateConcurrentLimitRequest, UpdateIpPolicyRequest, UpdateUserPreferenceRequest,
    UserIdPath, UserPreferenceResponse,
};
use validator::Validate;

use crate::error::AppError;
use crate::models::UserPreference;
use crate::repositories::PaginationParams;
use crate::state::AppState;

fn to_response(preference: UserPreference) -> UserPreferenceResponse {
    UserPreferenceResponse {
        user_id: preference.user_id,
        username: preference.username,
        avatar_url: preference.avatar_url,
        hidden: preference.hidden,
        default_block: preference.default_block,
        network_policy: preference.network_policy,
        ip_access_policy: preference.ip_access_policy,
        allowed_ips: preference.allowed_ips.iter().map(|ip| ip.to_string()).collect(),
        concurrent_stream_limit: preference.concurrent_stream_limit,
    }
}

pub async fn list_users(state: web::Data<AppState>, query: web::Query<PageQuery>) -> Result<HttpResponse, AppError> {
    let pagination = PaginationParams::new(query.limit, query.offset);
    let page = state.repositories.user_preferences.list_all(pagination).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: page.data.into_iter().map(to_response).collect(),
        total: page.total,
        limit: page.limit,
        offset: page.offset,
        has_more: page.has_more(),
    }))
}

pub async fn update_preference(
    state: web::Data<AppState>,
    path: web::Path<UserIdPath>,
    body: web::Json<UpdateUserPreferenceRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let preference = state
        .repositories
        .user_preferences
        .update_policy(&path.user_id, body.default_block, body.network_policy)
        .await?;
    Ok(HttpResponse::Ok().json(to_response(preference)))
}

pub async fn update_ip_policy(
    state: web::Data<AppState>,
    path: web::Path<UserIdPath>,
    body: web::Json<UpdateIpPolicyRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let allowed_ips: Vec<IpNetwork> = body
        .allowed_ips
        .iter()
        .map(|raw| IpNetwork::from_str(raw).map_err(|_| AppError::Validation(format!("invalid IP or CIDR: {raw}"))))
        .collect::<Result<_, _>>()?;

    let preference = state
        .repositories
        .user_preferences
        .update_ip_policy(&path.user_id, body.ip_access_policy, &allowed_ips)
        .await?;
    Ok(HttpResponse::Ok().json(to_response(preference)))
}

pub async fn update_concurrent_limit(
    state: web::Data<AppState>,
    path: web::Path<UserIdPath>,
    body: web::Json<UpdateConcurrentLimitRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let preference = state
        .repositories
        .user_preferences
        .update_concurrent_limit(&path.user_id, body.concurrent_stream_limit)
        .await?;
    Ok(HttpResponse::Ok().json(to_response(preference)))
}

pub async fn hide_user(state: web::Data<AppState>, path: web::Path<UserIdPath>) -> Result<HttpResponse, AppError> {
    let preference = state.repositories.user_preferences.set_hidden(&path.user_id, true).await?;
    Ok(HttpResponse::Ok().json(to_response(preference)))
}

pub async fn show_user(state: web::Data<AppState>, path: web::Path<UserIdPath>) -> Result<HttpResponse, AppError> {
    let preference = state.repositories.user_preferences.set_hidden(&path.user_id, false).await?;
    Ok(HttpResponse::Ok().json(to_response(preference)))
}
