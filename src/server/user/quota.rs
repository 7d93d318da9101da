use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequirePrincipal;
use crate::server::AppState;
use crate::server::dto::{CheckParams, PaginationParams};
use crate::server::quota::{check_subject, quota_info};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, paginate, parse_id_cursor,
};

pub async fn get_quota(
    auth: RequirePrincipal,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let info = quota_info(&state, auth.principal)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(info)))
}

pub async fn check_quota(
    auth: RequirePrincipal,
    State(state): State<Arc<AppState>>,
    Query(params): Query<CheckParams>,
) -> impl IntoResponse {
    let allowed = check_subject(&state, auth.principal, &params.subject)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(allowed)))
}

pub async fn list_attachments(
    auth: RequirePrincipal,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = parse_id_cursor(params.cursor.as_deref())?;

    let attachments = state
        .store
        .list_attachments(auth.principal, cursor, DEFAULT_PAGE_SIZE + 1)?;

    let (attachments, next_cursor, has_more) =
        paginate(attachments, DEFAULT_PAGE_SIZE as usize, |a| a.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        attachments,
        next_cursor,
        has_more,
    )))
}

pub async fn list_artifacts(
    auth: RequirePrincipal,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = parse_id_cursor(params.cursor.as_deref())?;

    let artifacts = state
        .store
        .list_artifacts(auth.principal, cursor, DEFAULT_PAGE_SIZE + 1)?;

    let (artifacts, next_cursor, has_more) =
        paginate(artifacts, DEFAULT_PAGE_SIZE as usize, |a| a.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        artifacts,
        next_cursor,
        has_more,
    )))
}

pub async fn list_packages(
    auth: RequirePrincipal,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = parse_id_cursor(params.cursor.as_deref())?;

    let packages = state
        .store
        .list_packages(auth.principal, cursor, DEFAULT_PAGE_SIZE + 1)?;

    let (packages, next_cursor, has_more) =
        paginate(packages, DEFAULT_PAGE_SIZE as usize, |p| p.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        packages,
        next_cursor,
        has_more,
    )))
}
