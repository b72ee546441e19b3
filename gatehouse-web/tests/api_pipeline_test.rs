//! Request pipeline tests: rate limit, route table and directory endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use gatehouse_core::{GatehouseConfig, SystemClock};
use gatehouse_web::auth::users::{MemoryUserStore, PasswordHashing, SEED_PASSWORD};
use gatehouse_web::{create_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let mut config = GatehouseConfig::default();
    config.server.dev_mode = true;
    let users = Arc::new(MemoryUserStore::seeded(PasswordHashing::low_cost()).unwrap());
    let state = AppState::with_parts(config, users, SystemClock::shared()).unwrap();
    create_app(state)
}

fn get(uri: &str, token: Option<&str>, client: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(uri)
        .header("X-Forwarded-For", client);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn extract_json_response(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Log in through the token endpoint and return the access token
async fn access_token(app: &Router, username: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v2/auth/login")
        .header("Content-Type", "application/json")
        .header("X-Forwarded-For", format!("login-{}", username))
        .body(Body::from(
            json!({ "username": username, "password": SEED_PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    extract_json_response(response).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_public_endpoints() {
    let app = test_app();

    for uri in ["/api/health", "/api/home"] {
        let response = app.clone().oneshot(get(uri, None, "192.0.2.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    let response = app.clone().oneshot(get("/api/stats", None, "192.0.2.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = extract_json_response(response).await;
    assert_eq!(stats["totalUsers"], 11);
    assert_eq!(stats["activeUsers"], 9);
    assert_eq!(stats["usersByRole"]["MANAGER"], 2);
}

#[tokio::test]
async fn test_anonymous_requests_are_unauthorized() {
    let app = test_app();

    for uri in ["/api/users", "/api/users/1", "/api/roles", "/api/v2/auth/me"] {
        let response = app.clone().oneshot(get(uri, None, "192.0.2.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body = extract_json_response(response).await;
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_roles_require_admin() {
    let app = test_app();

    let user = access_token(&app, "zhangsan").await;
    let response = app.clone().oneshot(get("/api/roles", Some(&user), "192.0.2.3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(extract_json_response(response).await["error"], "forbidden");

    let admin = access_token(&app, "admin").await;
    let response = app.clone().oneshot(get("/api/roles", Some(&admin), "192.0.2.3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let roles = extract_json_response(response).await;
    let codes: Vec<_> = roles
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["SUPER_ADMIN", "ADMIN", "MANAGER", "USER", "GUEST"]);
}

#[tokio::test]
async fn test_catalog_lookups() {
    let app = test_app();
    let admin = access_token(&app, "admin").await;

    let fetch = |uri: &'static str, expected: StatusCode| {
        let app = app.clone();
        let admin = admin.clone();
        async move {
            let response = app.oneshot(get(uri, Some(&admin), "192.0.2.11")).await.unwrap();
            assert_eq!(response.status(), expected, "{}", uri);
            extract_json_response(response).await
        }
    };

    let manager = fetch("/api/roles/3", StatusCode::OK).await;
    assert_eq!(manager["code"], "MANAGER");
    assert_eq!(manager["status"], "ACTIVE");
    let missing = fetch("/api/roles/42", StatusCode::NOT_FOUND).await;
    assert_eq!(missing["error"], "not_found");

    let active = fetch("/api/roles/active", StatusCode::OK).await;
    assert_eq!(active.as_array().unwrap().len(), 5);

    let detailed = fetch("/api/roles/with-permissions", StatusCode::OK).await;
    assert_eq!(detailed[4]["code"], "GUEST");
    assert_eq!(detailed[4]["permissionDetails"][0]["code"], "dashboard:view");

    let guest = fetch("/api/roles/5/permissions", StatusCode::OK).await;
    assert_eq!(guest["permissionDetails"].as_array().unwrap().len(), 1);

    let permission = fetch("/api/permissions/7", StatusCode::OK).await;
    assert_eq!(permission["code"], "role:view");
    fetch("/api/permissions/99", StatusCode::NOT_FOUND).await;

    let modules = fetch("/api/permissions/modules", StatusCode::OK).await;
    assert_eq!(modules.as_array().unwrap().len(), 5);
    assert_eq!(modules[0], "User Management");

    let active = fetch("/api/permissions/active", StatusCode::OK).await;
    assert_eq!(active.as_array().unwrap().len(), 20);

    let system = fetch("/api/permissions/active/module/System", StatusCode::OK).await;
    let codes: Vec<_> = system
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["system:settings", "system:monitor", "system:backup"]);

    let spaced = fetch("/api/permissions/active/module/User%20Management", StatusCode::OK).await;
    assert_eq!(spaced.as_array().unwrap().len(), 6);

    // Catalog details stay admin-only
    let user = access_token(&app, "zhangsan").await;
    for uri in ["/api/roles/1", "/api/permissions/modules"] {
        let response = app.clone().oneshot(get(uri, Some(&user), "192.0.2.11")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_manager_reaches_users_but_not_permissions() {
    let app = test_app();
    let manager = access_token(&app, "wangwu").await;

    let response = app.clone().oneshot(get("/api/users", Some(&manager), "192.0.2.4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/permissions", Some(&manager), "192.0.2.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Authenticated callers reach unknown paths and get a plain 404
    let response = app.clone().oneshot(get("/api/unknown", Some(&manager), "192.0.2.4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_listing_filters_and_pages() {
    let app = test_app();
    let admin = access_token(&app, "admin").await;

    let page = |uri: &'static str| {
        let app = app.clone();
        let admin = admin.clone();
        async move {
            let response = app.oneshot(get(uri, Some(&admin), "192.0.2.5")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            extract_json_response(response).await
        }
    };

    let managers = page("/api/users?role=manager").await;
    assert_eq!(managers["totalElements"], 2);

    // Unrecognized filter values are ignored
    let all = page("/api/users?status=bogus&role=nobody").await;
    assert_eq!(all["totalElements"], 11);

    let pending = page("/api/users?status=PENDING").await;
    assert_eq!(pending["content"][0]["username"], "chener");

    let search = page("/api/users?search=zhang").await;
    assert_eq!(search["totalElements"], 1);
    assert_eq!(search["content"][0]["username"], "zhangsan");

    let last = page("/api/users?page=2&size=5").await;
    assert_eq!(last["totalPages"], 3);
    assert_eq!(last["content"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_user_by_id() {
    let app = test_app();
    let admin = access_token(&app, "admin").await;

    let response = app.clone().oneshot(get("/api/users/1", Some(&admin), "192.0.2.6")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json_response(response).await["username"], "admin");

    let response = app.clone().oneshot(get("/api/users/999", Some(&admin), "192.0.2.6")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_json_response(response).await["error"], "not_found");
}

#[tokio::test]
async fn test_api_rate_limit() {
    let app = test_app();

    for _ in 0..100 {
        let response = app.clone().oneshot(get("/api/health", None, "192.0.2.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/api/health", None, "192.0.2.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = extract_json_response(response).await;
    assert_eq!(body["error"], "rate_limited");
    assert!(body["message"].is_string());

    // Other clients are unaffected
    let response = app.clone().oneshot(get("/api/health", None, "192.0.2.8")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Token endpoints are outside the generic limit
    let request = Request::builder()
        .method("POST")
        .uri("/api/v2/auth/login")
        .header("Content-Type", "application/json")
        .header("X-Forwarded-For", "192.0.2.7")
        .body(Body::from(
            json!({ "username": "admin", "password": SEED_PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_runs_before_authentication() {
    let app = test_app();
    let admin = access_token(&app, "admin").await;

    for _ in 0..100 {
        app.clone().oneshot(get("/api/users", None, "192.0.2.9")).await.unwrap();
    }

    // Valid credentials still get 429 once the client is throttled
    let response = app.clone().oneshot(get("/api/users", Some(&admin), "192.0.2.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
