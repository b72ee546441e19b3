//! HTTP request handlers for the Gatehouse admin API
//!
//! Authentication handlers live under [`crate::auth`].

use crate::{auth::AuthError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use gatehouse_applications::auth::catalog::{self, PermissionDef, RoleDef, RoleWithPermissions};
use gatehouse_core::{Page, PageRequest, Role, UserFilter, UserSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: DateTime<Utc>,
    version: String,
    uptime_secs: u64,
}

/// Landing page data
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub title: &'static str,
    pub description: &'static str,
    pub current_time: DateTime<Utc>,
    pub features: Vec<&'static str>,
}

/// Directory statistics
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: usize,
    pub active_users: usize,
    pub users_by_role: BTreeMap<&'static str, usize>,
}

/// User listing query parameters
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        title: "Gatehouse",
        description: "Role-based administration backend",
        current_time: Utc::now(),
        features: vec![
            "Session and token authentication",
            "Role-based access control",
            "Per-client rate limiting",
            "User directory",
        ],
    })
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AuthError> {
    let accounts = state.directory.list(&UserFilter::default()).await?;

    let mut users_by_role: BTreeMap<&'static str, usize> =
        Role::ALL.iter().map(|role| (role.as_str(), 0)).collect();
    for account in &accounts {
        *users_by_role.entry(account.role.as_str()).or_default() += 1;
    }

    Ok(Json(StatsResponse {
        total_users: accounts.len(),
        active_users: accounts.iter().filter(|a| a.status.is_active()).count(),
        users_by_role,
    }))
}

/// Paged, filtered user listing
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<UserSummary>>, AuthError> {
    let filter = UserFilter::parse(
        query.search.as_deref(),
        query.status.as_deref(),
        query.role.as_deref(),
    );
    debug!(?filter, "Listing users");

    let summaries = state
        .directory
        .list(&filter)
        .await?
        .iter()
        .map(|account| account.summary())
        .collect();

    Ok(Json(Page::from_items(
        summaries,
        PageRequest::new(query.page, query.size),
    )))
}

fn not_found(message: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": message,
        })),
    )
        .into_response()
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, AuthError> {
    match state.directory.find_by_id(id).await? {
        Some(account) => Ok(Json(account.summary()).into_response()),
        None => Ok(not_found(format!("User {} not found", id))),
    }
}

pub async fn list_roles() -> Json<Vec<RoleDef>> {
    Json(catalog::roles())
}

pub async fn active_roles() -> Json<Vec<RoleDef>> {
    Json(catalog::active_roles())
}

pub async fn roles_with_permissions() -> Json<Vec<RoleWithPermissions>> {
    Json(catalog::roles_with_permissions())
}

pub async fn get_role(Path(id): Path<u64>) -> Response {
    match catalog::role(id) {
        Some(role) => Json(role).into_response(),
        None => not_found(format!("Role {} not found", id)),
    }
}

/// One role with its permissions resolved
pub async fn get_role_permissions(Path(id): Path<u64>) -> Response {
    match catalog::role_with_permissions(id) {
        Some(role) => Json(role).into_response(),
        None => not_found(format!("Role {} not found", id)),
    }
}

pub async fn list_permissions() -> Json<&'static [PermissionDef]> {
    Json(catalog::permissions())
}

pub async fn get_permission(Path(id): Path<u64>) -> Response {
    match catalog::permission(id) {
        Some(permission) => Json(permission).into_response(),
        None => not_found(format!("Permission {} not found", id)),
    }
}

pub async fn active_permissions() -> Json<Vec<&'static PermissionDef>> {
    Json(catalog::active_permissions())
}

/// Active permissions of one module; unknown modules give an empty list
pub async fn module_permissions(Path(module): Path<String>) -> Json<Vec<&'static PermissionDef>> {
    Json(catalog::active_permissions_in(&module))
}

pub async fn permission_modules() -> Json<Vec<&'static str>> {
    Json(catalog::modules())
}
