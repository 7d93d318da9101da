//! Quota introspection shared by the admin and self APIs, plus the remote
//! authorization endpoint.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::RequireAdmin;
use crate::quota::gate;
use crate::server::AppState;
use crate::server::dto::AuthorizeRequest;
use crate::server::response::ApiError;
use crate::types::{LimitSubject, Principal, QuotaSnapshot};

/// Usage, effective groups, and effective rules of `principal`.
pub fn quota_info(state: &AppState, principal: Principal) -> Result<QuotaSnapshot, ApiError> {
    Ok(state
        .store
        .quota_snapshot(principal, &state.quota.default_groups)?)
}

/// Whether `principal` may currently write to `subject`.
pub fn check_subject(
    state: &AppState,
    principal: Principal,
    subject: &str,
) -> Result<bool, ApiError> {
    let subject = LimitSubject::parse(subject)?;
    let evaluation = gate::check(state.store.as_ref(), &state.quota, principal, subject)?;
    Ok(evaluation.allowed)
}

/// Gate for forges running out of process: 204 when the operation may
/// proceed, 413 when a quota rule denies it.
pub async fn authorize(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthorizeRequest>,
) -> impl IntoResponse {
    gate::enforce_operation(
        state.store.as_ref(),
        &state.quota,
        req.principal,
        &req.operation,
    )?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
