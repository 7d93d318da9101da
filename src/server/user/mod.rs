mod quota;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;
use crate::server::quota::authorize;

/// Self-service routes act on the principal bound to the caller's token.
/// `/quota/authorize` takes an admin token and an explicit principal.
pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/quota", get(quota::get_quota))
        .route("/user/quota/check", get(quota::check_quota))
        .route("/user/quota/attachments", get(quota::list_attachments))
        .route("/user/quota/artifacts", get(quota::list_artifacts))
        .route("/user/quota/packages", get(quota::list_packages))
        .route("/quota/authorize", post(authorize))
}
