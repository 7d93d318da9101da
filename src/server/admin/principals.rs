use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{CheckParams, SetGroupsRequest};
use crate::server::quota::{check_subject, quota_info};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::Principal;

fn set_groups(
    state: &AppState,
    principal: Principal,
    groups: &[String],
) -> Result<StatusCode, ApiError> {
    state.store.set_principal_groups(principal, groups)?;
    tracing::info!(%principal, ?groups, "quota groups replaced");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_user_quota(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let info = quota_info(&state, Principal::user(id))?;
    Ok::<_, ApiError>(Json(ApiResponse::success(info)))
}

pub async fn set_user_groups(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SetGroupsRequest>,
) -> impl IntoResponse {
    set_groups(&state, Principal::user(id), &req.groups)
}

pub async fn check_user_quota(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<CheckParams>,
) -> impl IntoResponse {
    let allowed = check_subject(&state, Principal::user(id), &params.subject)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(allowed)))
}

pub async fn get_org_quota(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let info = quota_info(&state, Principal::org(id))?;
    Ok::<_, ApiError>(Json(ApiResponse::success(info)))
}

pub async fn set_org_groups(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SetGroupsRequest>,
) -> impl IntoResponse {
    set_groups(&state, Principal::org(id), &req.groups)
}

pub async fn check_org_quota(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<CheckParams>,
) -> impl IntoResponse {
    let allowed = check_subject(&state, Principal::org(id), &params.subject)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(allowed)))
}
