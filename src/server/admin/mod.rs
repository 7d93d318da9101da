mod groups;
mod principals;
mod rules;
mod tokens;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Rule routes
        .route("/quota/rules", post(rules::create_rule))
        .route("/quota/rules", get(rules::list_rules))
        .route("/quota/rules/{name}", get(rules::get_rule))
        .route("/quota/rules/{name}", patch(rules::update_rule))
        .route("/quota/rules/{name}", delete(rules::delete_rule))
        // Group routes
        .route("/quota/groups", post(groups::create_group))
        .route("/quota/groups", get(groups::list_groups))
        .route("/quota/groups/{name}", get(groups::get_group))
        .route("/quota/groups/{name}", delete(groups::delete_group))
        .route("/quota/groups/{name}/rules/{rule}", put(groups::add_rule))
        .route("/quota/groups/{name}/rules/{rule}", delete(groups::remove_rule))
        .route("/quota/groups/{name}/users", get(groups::list_members))
        .route("/quota/groups/{name}/users/{id}", put(groups::add_user))
        .route("/quota/groups/{name}/users/{id}", delete(groups::remove_user))
        .route("/quota/groups/{name}/orgs/{id}", put(groups::add_org))
        .route("/quota/groups/{name}/orgs/{id}", delete(groups::remove_org))
        // Principal quota routes
        .route("/users/{id}/quota", get(principals::get_user_quota))
        .route("/users/{id}/quota/groups", post(principals::set_user_groups))
        .route("/users/{id}/quota/check", get(principals::check_user_quota))
        .route("/orgs/{id}/quota", get(principals::get_org_quota))
        .route("/orgs/{id}/quota/groups", post(principals::set_org_groups))
        .route("/orgs/{id}/quota/check", get(principals::check_org_quota))
        // Token routes
        .route("/tokens", post(tokens::create_token))
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens/{id}", get(tokens::get_token))
        .route("/tokens/{id}", delete(tokens::delete_token))
}
