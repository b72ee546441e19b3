//! Route definitions for the Gatehouse web server

use crate::{auth, handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Public info
        .route("/health", get(handlers::health_check))
        .route("/home", get(handlers::home))
        .route("/stats", get(handlers::stats))
        // Session authentication
        .nest("/auth", session_auth_routes())
        // Token authentication
        .nest("/v2/auth", token_auth_routes())
        // Directory and catalog
        .route("/users", get(handlers::list_users))
        .route("/users/{id}", get(handlers::get_user))
        .route("/roles", get(handlers::list_roles))
        .route("/roles/active", get(handlers::active_roles))
        .route("/roles/with-permissions", get(handlers::roles_with_permissions))
        .route("/roles/{id}", get(handlers::get_role))
        .route("/roles/{id}/permissions", get(handlers::get_role_permissions))
        .route("/permissions", get(handlers::list_permissions))
        .route("/permissions/active", get(handlers::active_permissions))
        .route(
            "/permissions/active/module/{module}",
            get(handlers::module_permissions),
        )
        .route("/permissions/modules", get(handlers::permission_modules))
        .route("/permissions/{id}", get(handlers::get_permission))
}

fn session_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::session_handlers::login))
        .route("/logout", post(auth::session_handlers::logout))
        .route("/me", get(auth::session_handlers::me))
}

fn token_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::handlers::login))
        .route("/refresh", post(auth::handlers::refresh))
        .route("/logout", post(auth::handlers::logout))
        .route("/me", get(auth::handlers::me))
}
