use actix_web::{web, HttpResponse};
use plexguard_shared::{CreateTimeRuleRequest, RuleIdPath, TimeRuleResponse, UpdateTimeRuleRequest, UserIdPath};
use validator::Validate;

use crate::error::AppError;
use crate::models::TimeRule;
use crate::state::AppState;

pub(crate) fn rule_to_response(rule: TimeRule) -> TimeRuleResponse {
    TimeRuleResponse {
        id: rule.id,
        user_id: rule.user_id,
        device_identifier: rule.device_identifier,
        day_of_week: rule.day_of_week,
        start_time: rule.start_time,
        end_time: rule.end_time,
        enabled: rule.enabled,
        rule_name: rule.rule_name,
    }
}

pub async fn list_rules(state: web::Data<AppState>, path: web::Path<UserIdPath>) -> Result<HttpResponse, AppError> {
    let rules = state.repositories.time_rules.list_for_user(&path.user_id).await?;
    Ok(HttpResponse::Ok().json(rules.into_iter().map(rule_to_response).collect::<Vec<_>>()))
}

pub async fn create_rule(
    state: web::Data<AppState>,
    path: web::Path<UserIdPath>,
    body: web::Json<CreateTimeRuleRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let rule = state
        .repositories
        .time_rules
        .create(
            &path.user_id,
            body.device_identifier.as_deref(),
            body.day_of_week,
            &body.start_time,
            &body.end_time,
            body.enabled,
            &body.rule_name,
        )
        .await?;

    Ok(HttpResponse::Created().json(rule_to_response(rule)))
}

pub async fn update_rule(
    state: web::Data<AppState>,
    path: web::Path<RuleIdPath>,
    body: web::Json<UpdateTimeRuleRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let rule = state
        .repositories
        .time_rules
        .update(
            path.id,
            body.day_of_week,
            body.start_time.as_deref(),
            body.end_time.as_deref(),
            body.enabled,
            body.rule_name.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(rule_to_response(rule)))
}

pub async fn delete_rule(state: web::Data<AppState>, path: web::Path<RuleIdPath>) -> Result<HttpResponse, AppError> {
    let deleted = state.repositories.time_rules.delete(path.id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("time rule {} not found", path.id)));
    }
    Ok(HttpResponse::NoContent().finish())
}
