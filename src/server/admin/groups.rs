use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateGroupRequest, PaginationParams};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, paginate,
    parse_id_cursor,
};
use crate::server::validation::validate_group_name;
use crate::types::Principal;

pub async fn create_group(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    validate_group_name(&req.name)?;

    let group = state.store.create_group(&req.name)?;
    tracing::info!(group = %group.name, "quota group created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(group))))
}

pub async fn list_groups(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let groups = state.store.list_groups()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(groups)))
}

pub async fn get_group(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let group = state
        .store
        .get_group(&name)?
        .or_not_found("Group not found")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(group)))
}

pub async fn delete_group(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    state.store.delete_group(&name)?;
    tracing::info!(group = %name, "quota group deleted");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn add_rule(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((group, rule)): Path<(String, String)>,
) -> impl IntoResponse {
    state.store.add_rule_to_group(&group, &rule)?;
    tracing::info!(%group, %rule, "rule added to quota group");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn remove_rule(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((group, rule)): Path<(String, String)>,
) -> impl IntoResponse {
    state.store.remove_rule_from_group(&group, &rule)?;
    tracing::info!(%group, %rule, "rule removed from quota group");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = parse_id_cursor(params.cursor.as_deref())?;

    let members = state
        .store
        .list_group_members(&group, cursor, DEFAULT_PAGE_SIZE + 1)?;

    let (members, next_cursor, has_more) =
        paginate(members, DEFAULT_PAGE_SIZE as usize, |m| m.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        members,
        next_cursor,
        has_more,
    )))
}

fn add_member(state: &AppState, group: &str, principal: Principal) -> Result<StatusCode, ApiError> {
    state.store.add_group_member(group, principal)?;
    tracing::info!(%group, %principal, "principal added to quota group");
    Ok(StatusCode::NO_CONTENT)
}

fn remove_member(
    state: &AppState,
    group: &str,
    principal: Principal,
) -> Result<StatusCode, ApiError> {
    state.store.remove_group_member(group, principal)?;
    tracing::info!(%group, %principal, "principal removed from quota group");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((group, id)): Path<(String, i64)>,
) -> impl IntoResponse {
    add_member(&state, &group, Principal::user(id))
}

pub async fn remove_user(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((group, id)): Path<(String, i64)>,
) -> impl IntoResponse {
    remove_member(&state, &group, Principal::user(id))
}

pub async fn add_org(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((group, id)): Path<(String, i64)>,
) -> impl IntoResponse {
    add_member(&state, &group, Principal::org(id))
}

pub async fn remove_org(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path((group, id)): Path<(String, i64)>,
) -> impl IntoResponse {
    remove_member(&state, &group, Principal::org(id))
}
