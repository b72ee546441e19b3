//! Authentication system integration tests

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use gatehouse_core::{
    GatehouseConfig, Identity, ManualClock, Role, SharedClock, SystemClock, UserStatus,
};
use gatehouse_web::auth::users::{MemoryUserStore, PasswordHashing, SEED_PASSWORD};
use gatehouse_web::{create_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_state(clock: SharedClock) -> AppState {
    let mut config = GatehouseConfig::default();
    config.server.dev_mode = true;
    let users = Arc::new(MemoryUserStore::seeded(PasswordHashing::low_cost()).unwrap());
    AppState::with_parts(config, users, clock).unwrap()
}

fn test_app_with_clock(clock: SharedClock) -> Router {
    create_app(test_state(clock))
}

fn test_app() -> Router {
    test_app_with_clock(SystemClock::shared())
}

/// Test helper to create a request from a fixed client address
fn create_request(
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
    client: &str,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Forwarded-For", client);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    if let Some(body) = body {
        builder = builder.header("Content-Type", "application/json");
        builder
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

/// Test helper to extract JSON response
async fn extract_json_response(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn token_login(app: &Router, username: &str, password: &str, client: &str) -> axum::response::Response {
    let request = create_request(
        "POST",
        "/api/v2/auth/login",
        Some(json!({ "username": username, "password": password })),
        None,
        client,
    );
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_token_login_and_me() {
    let app = test_app();

    let response = token_login(&app, "admin", SEED_PASSWORD, "198.51.100.1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json_response(response).await;
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "ADMIN");
    assert!(body["user"].get("passwordHash").is_none());

    let token = body["accessToken"].as_str().unwrap();
    let request = create_request("GET", "/api/v2/auth/me", None, Some(token), "198.51.100.1");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json_response(response).await["username"], "admin");
}

#[tokio::test]
async fn test_sixth_login_is_rate_limited() {
    let app = test_app();

    for _ in 0..5 {
        let response = token_login(&app, "admin", "wrong-password", "203.0.113.5").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = extract_json_response(response).await;
        assert_eq!(body["error"], "invalid_credentials");
    }

    // Correct credentials do not help once the bucket is empty
    let response = token_login(&app, "admin", SEED_PASSWORD, "203.0.113.5").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(extract_json_response(response).await["error"], "rate_limited");

    let response = token_login(&app, "admin", SEED_PASSWORD, "203.0.113.6").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_bucket_refills() {
    let clock = Arc::new(ManualClock::new());
    let app = test_app_with_clock(clock.clone());

    for _ in 0..5 {
        token_login(&app, "admin", "wrong-password", "203.0.113.7").await;
    }
    let response = token_login(&app, "admin", SEED_PASSWORD, "203.0.113.7").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    clock.advance(Duration::from_secs(60));
    let response = token_login(&app, "admin", SEED_PASSWORD, "203.0.113.7").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_inactive_accounts_get_no_tokens() {
    let app = test_app();

    for username in ["chener", "liuyi"] {
        let response = token_login(&app, username, SEED_PASSWORD, "198.51.100.2").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = extract_json_response(response).await;
        assert_eq!(body["error"], "account_not_active");
        assert!(body.get("accessToken").is_none());
        assert!(body.get("refreshToken").is_none());
    }
}

#[tokio::test]
async fn test_refresh_flow() {
    let app = test_app();
    let login = extract_json_response(token_login(&app, "wangwu", SEED_PASSWORD, "198.51.100.3").await).await;
    let access = login["accessToken"].as_str().unwrap();
    let refresh = login["refreshToken"].as_str().unwrap();

    // Access token presented for refresh
    let request = create_request(
        "POST",
        "/api/v2/auth/refresh",
        Some(json!({ "refreshToken": access })),
        None,
        "198.51.100.3",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(extract_json_response(response).await["error"], "unauthorized");

    let request = create_request(
        "POST",
        "/api/v2/auth/refresh",
        Some(json!({ "refreshToken": refresh })),
        None,
        "198.51.100.3",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json_response(response).await;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3600);
    assert!(body.get("refreshToken").is_none());

    let fresh = body["accessToken"].as_str().unwrap();
    let request = create_request("GET", "/api/users", None, Some(fresh), "198.51.100.3");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_requires_token() {
    let app = test_app();

    for body in [json!({ "refreshToken": "" }), json!({})] {
        let request = create_request("POST", "/api/v2/auth/refresh", Some(body), None, "198.51.100.4");
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            extract_json_response(response).await["error"],
            "missing_refresh_token"
        );
    }

    let request = create_request(
        "POST",
        "/api/v2/auth/refresh",
        Some(json!({ "refreshToken": "garbage" })),
        None,
        "198.51.100.4",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer() {
    let app = test_app();
    let login = extract_json_response(token_login(&app, "admin", SEED_PASSWORD, "198.51.100.5").await).await;
    let refresh = login["refreshToken"].as_str().unwrap();

    let request = create_request("GET", "/api/v2/auth/me", None, Some(refresh), "198.51.100.5");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_expires() {
    let clock = Arc::new(ManualClock::new());
    let app = test_app_with_clock(clock.clone());
    let login = extract_json_response(token_login(&app, "admin", SEED_PASSWORD, "198.51.100.6").await).await;
    let access = login["accessToken"].as_str().unwrap();

    clock.advance(Duration::from_secs(3600));
    let request = create_request("GET", "/api/v2/auth/me", None, Some(access), "198.51.100.6");
    assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);

    clock.advance(Duration::from_secs(1));
    let request = create_request("GET", "/api/v2/auth/me", None, Some(access), "198.51.100.6");
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_token_logout() {
    let app = test_app();

    let request = create_request("POST", "/api/v2/auth/logout", None, None, "198.51.100.7");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let login = extract_json_response(token_login(&app, "lisi", SEED_PASSWORD, "198.51.100.7").await).await;
    let access = login["accessToken"].as_str().unwrap();
    let request = create_request("POST", "/api/v2/auth/logout", None, Some(access), "198.51.100.7");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        extract_json_response(response).await["message"],
        "Logged out successfully"
    );
}

fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_session_cookie_flow() {
    let app = test_app();

    let request = create_request(
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "admin", "password": SEED_PASSWORD })),
        None,
        "198.51.100.8",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("GATEHOUSE_SESSION="));

    let body = extract_json_response(response).await;
    assert_eq!(body["username"], "admin");
    assert_eq!(body["fullName"], "System Administrator");

    let with_cookie = |method: &str, uri: &str| {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Forwarded-For", "198.51.100.8")
            .header(header::COOKIE, cookie.as_str())
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(with_cookie("GET", "/api/auth/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json_response(response).await["role"], "ADMIN");

    // The session authenticates the protected API too
    let response = app.clone().oneshot(with_cookie("GET", "/api/roles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(with_cookie("POST", "/api/auth/logout")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(with_cookie("GET", "/api/auth/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = app.clone().oneshot(with_cookie("GET", "/api/roles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_login_rejects_bad_password() {
    let app = test_app();

    let request = create_request(
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "admin", "password": "nope" })),
        None,
        "198.51.100.9",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        extract_json_response(response).await["error"],
        "invalid_credentials"
    );
}

#[tokio::test]
async fn test_refresh_failures_are_indistinguishable() {
    let state = test_state(SystemClock::shared());
    let app = create_app(state.clone());

    let inactive = state
        .tokens
        .issue_refresh_token(&Identity::new("liuyi", Role::User, UserStatus::Inactive))
        .unwrap();
    let unknown = state
        .tokens
        .issue_refresh_token(&Identity::new("ghost", Role::User, UserStatus::Active))
        .unwrap();
    let access = state
        .tokens
        .issue_access_token(&Identity::new("admin", Role::Admin, UserStatus::Active))
        .unwrap();

    let mut bodies = Vec::new();
    for token in [inactive.as_str(), unknown.as_str(), access.as_str(), "garbage"] {
        let request = create_request(
            "POST",
            "/api/v2/auth/refresh",
            Some(json!({ "refreshToken": token })),
            None,
            "198.51.100.10",
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        bodies.push(body);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    let body: Value = serde_json::from_slice(&bodies[0]).unwrap();
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_token_endpoints_ignore_session_cookie() {
    let app = test_app();

    let request = create_request(
        "POST",
        "/api/auth/login",
        Some(json!({ "username": "admin", "password": SEED_PASSWORD })),
        None,
        "198.51.100.11",
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let login = extract_json_response(token_login(&app, "zhangsan", SEED_PASSWORD, "198.51.100.11").await).await;
    let bearer = login["accessToken"].as_str().unwrap();

    // Both credentials: the bearer decides
    let mut request = create_request("GET", "/api/v2/auth/me", None, Some(bearer), "198.51.100.11");
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json_response(response).await["username"], "zhangsan");

    // Cookie alone is not enough for the token family
    let mut request = create_request("GET", "/api/v2/auth/me", None, None, "198.51.100.11");
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The session family still honors it
    let mut request = create_request("GET", "/api/auth/me", None, None, "198.51.100.11");
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json_response(response).await["username"], "admin");
}
