use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateRuleRequest, UpdateRuleRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::{parse_subjects, validate_rule_name};
use crate::types::Rule;

pub async fn create_rule(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    validate_rule_name(&req.name)?;
    let subjects = parse_subjects(&req.subjects)?;
    let rule = Rule::new(req.name, req.limit, subjects)?;

    state.store.create_rule(&rule)?;
    tracing::info!(rule = %rule.name, limit = rule.limit, "quota rule created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(rule))))
}

pub async fn list_rules(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rules = state.store.list_rules()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(rules)))
}

pub async fn get_rule(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let rule = state.store.get_rule(&name)?.or_not_found("Rule not found")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(rule)))
}

pub async fn update_rule(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<UpdateRuleRequest>,
) -> impl IntoResponse {
    let subjects = req.subjects.as_deref().map(parse_subjects).transpose()?;

    let rule = state.store.update_rule(&name, req.limit, subjects)?;
    tracing::info!(rule = %rule.name, limit = rule.limit, "quota rule updated");

    Ok::<_, ApiError>(Json(ApiResponse::success(rule)))
}

pub async fn delete_rule(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    state.store.delete_rule(&name)?;
    tracing::info!(rule = %name, "quota rule deleted");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
