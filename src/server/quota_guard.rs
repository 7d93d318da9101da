//! HTTP gate in front of write handlers.
//!
//! The embedding forge's routing layer classifies each request and inserts a
//! [`QuotaTarget`] extension; `enforce_quota` then decides whether the
//! handler runs at all.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::quota::{Operation, gate};
use crate::server::AppState;
use crate::server::response::ApiError;
use crate::types::Principal;

/// Who is writing and what the write is.
#[derive(Debug, Clone)]
pub struct QuotaTarget {
    pub principal: Principal,
    pub operation: Operation,
}

impl QuotaTarget {
    #[must_use]
    pub fn new(principal: Principal, operation: Operation) -> Self {
        Self {
            principal,
            operation,
        }
    }
}

fn is_read_only(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::DELETE
    )
}

pub async fn enforce_quota(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if is_read_only(request.method()) {
        return next.run(request).await;
    }

    let Some(target) = request.extensions().get::<QuotaTarget>().cloned() else {
        tracing::error!(path = %request.uri().path(), "write reached quota gate without a target");
        return ApiError::internal("Internal server error").into_response();
    };

    match gate::enforce_operation(
        state.store.as_ref(),
        &state.quota,
        target.principal,
        &target.operation,
    ) {
        Ok(_) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}
