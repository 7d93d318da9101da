use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::user::user_router;
use crate::config::QuotaConfig;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    /// The `[quota]` section, loaded once at startup.
    pub quota: QuotaConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, quota: QuotaConfig) -> Self {
        Self { store, quota }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", user_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request as HttpRequest, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::TokenGenerator;
    use crate::store::SqliteStore;
    use crate::types::Principal;

    struct Harness {
        _temp: TempDir,
        store: Arc<SqliteStore>,
        router: Router,
        admin: String,
    }

    fn harness(quota: QuotaConfig) -> Harness {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(temp.path().join("test.db")).unwrap());
        store.initialize().unwrap();

        let (token, admin) = TokenGenerator::new().issue(true, None, None).unwrap();
        store.create_token(&token).unwrap();

        let state = Arc::new(AppState::new(store.clone(), quota));
        Harness {
            _temp: temp,
            store,
            router: create_router(state),
            admin,
        }
    }

    fn enabled() -> QuotaConfig {
        QuotaConfig {
            enabled: true,
            default_groups: Vec::new(),
        }
    }

    impl Harness {
        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let builder = HttpRequest::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"));
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            self.call(method, uri, &self.admin, body).await
        }

        fn principal_token(&self, principal: Principal) -> String {
            let (token, raw) = TokenGenerator::new()
                .issue(false, Some(principal), None)
                .unwrap();
            self.store.create_token(&token).unwrap();
            raw
        }
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness(QuotaConfig::default());
        let response = h
            .router
            .clone()
            .oneshot(HttpRequest::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let h = harness(QuotaConfig::default());
        let (status, body) = h
            .call(Method::GET, "/api/v1/admin/quota/groups", "bogus", None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["data"].is_null());

        let user = h.principal_token(Principal::user(1));
        let (status, _) = h
            .call(Method::GET, "/api/v1/admin/quota/groups", &user, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rule_and_group_lifecycle() {
        let h = harness(enabled());

        let (status, body) = h
            .admin(
                Method::POST,
                "/api/v1/admin/quota/rules",
                Some(json!({"name": "git-5g", "limit": 5_368_709_120_i64, "subjects": ["size:git:all"]})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["subjects"], json!(["size:git:all"]));

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/admin/quota/rules",
                Some(json!({"name": "git-5g", "limit": 1, "subjects": ["size:all"]})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/admin/quota/rules",
                Some(json!({"name": "bad", "limit": 1, "subjects": ["size:bogus"]})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/admin/quota/rules",
                Some(json!({"name": "bad", "limit": -2, "subjects": ["size:all"]})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = h
            .admin(
                Method::PATCH,
                "/api/v1/admin/quota/rules/git-5g",
                Some(json!({"limit": 1024})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["limit"], 1024);
        assert_eq!(body["data"]["subjects"], json!(["size:git:all"]));

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/admin/quota/groups",
                Some(json!({"name": "free-tier"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = h
            .admin(
                Method::PUT,
                "/api/v1/admin/quota/groups/free-tier/rules/git-5g",
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = h
            .admin(Method::GET, "/api/v1/admin/quota/groups/free-tier", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rules"][0]["name"], "git-5g");

        let (status, _) = h
            .admin(Method::PUT, "/api/v1/admin/quota/groups/free-tier/users/9", None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = h
            .admin(Method::PUT, "/api/v1/admin/quota/groups/free-tier/users/9", None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = h
            .admin(Method::GET, "/api/v1/admin/quota/groups/free-tier/users", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([{"kind": "user", "id": 9}]));

        let (status, _) = h
            .admin(Method::DELETE, "/api/v1/admin/quota/groups/free-tier", None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = h
            .admin(Method::DELETE, "/api/v1/admin/quota/rules/git-5g", None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = h
            .admin(Method::GET, "/api/v1/admin/quota/groups/free-tier", None)
            .await;
        assert_eq!(body["data"]["rules"], json!([]));

        let (status, _) = h
            .admin(Method::DELETE, "/api/v1/admin/quota/groups/free-tier/users/9", None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = h
            .admin(Method::DELETE, "/api/v1/admin/quota/groups/free-tier", None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = h
            .admin(Method::GET, "/api/v1/admin/quota/groups/free-tier", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_principal_quota_views() {
        let h = harness(enabled());
        h.store
            .connection()
            .execute(
                "INSERT INTO repository (owner_id, name, is_private, git_size, lfs_size)
                 VALUES (5, 'big', 0, 2048, 0)",
                [],
            )
            .unwrap();

        h.admin(
            Method::POST,
            "/api/v1/admin/quota/rules",
            Some(json!({"name": "tiny", "limit": 1024, "subjects": ["size:repos:all"]})),
        )
        .await;
        h.admin(
            Method::POST,
            "/api/v1/admin/quota/groups",
            Some(json!({"name": "small"})),
        )
        .await;
        h.admin(Method::PUT, "/api/v1/admin/quota/groups/small/rules/tiny", None)
            .await;

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/admin/users/5/quota/groups",
                Some(json!({"groups": ["small"]})),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = h
            .admin(Method::GET, "/api/v1/admin/users/5/quota", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["used"]["git"]["code"]["public"], 2048);
        assert_eq!(body["data"]["groups"][0]["name"], "small");
        assert_eq!(body["data"]["rules"][0]["name"], "tiny");

        let (_, body) = h
            .admin(
                Method::GET,
                "/api/v1/admin/users/5/quota/check?subject=size:repos:public",
                None,
            )
            .await;
        assert_eq!(body["data"], false);
        let (_, body) = h
            .admin(
                Method::GET,
                "/api/v1/admin/users/5/quota/check?subject=size:git:lfs",
                None,
            )
            .await;
        assert_eq!(body["data"], true);
        let (status, _) = h
            .admin(
                Method::GET,
                "/api/v1/admin/users/5/quota/check?subject=size:nope",
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/admin/orgs/5/quota/groups",
                Some(json!({"groups": ["missing"]})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let token = h.principal_token(Principal::user(5));
        let (status, body) = h.call(Method::GET, "/api/v1/user/quota", &token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rules"][0]["name"], "tiny");

        let (_, body) = h
            .call(
                Method::GET,
                "/api/v1/user/quota/check?subject=size:repos:private",
                &token,
                None,
            )
            .await;
        assert_eq!(body["data"], false);
    }

    #[tokio::test]
    async fn test_authorize_endpoint() {
        let h = harness(enabled());
        h.admin(
            Method::POST,
            "/api/v1/admin/quota/rules",
            Some(json!({"name": "deny-all", "limit": 0, "subjects": ["size:all"]})),
        )
        .await;
        h.admin(
            Method::POST,
            "/api/v1/admin/quota/groups",
            Some(json!({"name": "locked"})),
        )
        .await;
        h.admin(Method::PUT, "/api/v1/admin/quota/groups/locked/rules/deny-all", None)
            .await;
        h.admin(Method::PUT, "/api/v1/admin/quota/groups/locked/orgs/3", None)
            .await;

        let (status, body) = h
            .admin(
                Method::POST,
                "/api/v1/quota/authorize",
                Some(json!({
                    "principal": {"kind": "org", "id": 3},
                    "operation": {"type": "artifact-upload"}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["rule"], "deny-all");
        assert_eq!(body["subject"], "size:assets:artifacts");

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/quota/authorize",
                Some(json!({
                    "principal": {"kind": "user", "id": 3},
                    "operation": {"type": "artifact-upload"}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/quota/authorize",
                Some(json!({
                    "principal": {"kind": "org", "id": 3},
                    "operation": {"type": "read"}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_token_management() {
        let h = harness(QuotaConfig::default());

        let (status, body) = h
            .admin(
                Method::POST,
                "/api/v1/admin/tokens",
                Some(json!({"principal": {"kind": "org", "id": 8}})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let raw = body["data"]["token"].as_str().unwrap().to_string();
        let id = body["data"]["metadata"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["metadata"]["principal"], json!({"kind": "org", "id": 8}));

        let (status, body) = h.call(Method::GET, "/api/v1/user/quota", &raw, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["groups"], json!([]));

        let (_, body) = h.admin(Method::GET, "/api/v1/admin/tokens", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, _) = h
            .admin(Method::DELETE, &format!("/api/v1/admin/tokens/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = h.call(Method::GET, "/api/v1/user/quota", &raw, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = h
            .admin(
                Method::POST,
                "/api/v1/admin/tokens",
                Some(json!({"principal": {"kind": "user", "id": 1}, "expires_in_seconds": 0})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_token_cannot_use_self_api() {
        let h = harness(QuotaConfig::default());
        let (status, _) = h
            .admin(Method::GET, "/api/v1/user/quota", None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
