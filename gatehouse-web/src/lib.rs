//! Gatehouse Web Server
//!
//! HTTP surface of the Gatehouse admin backend: session and token login, the
//! user directory, and the role and permission catalog, all behind a rate
//! limit and a role-based route table.

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod server;
pub mod state;

// Re-export main types
pub use server::{GatehouseServer, GatehouseServerBuilder};
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    Router,
};
use gatehouse_applications::ApplicationError;
use gatehouse_core::{GatehouseError, LoggingConfig};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main application router
///
/// Request order: trace, CORS, API rate limit, authentication, authorization,
/// then the handler.
pub fn create_app(state: AppState) -> Router {
    let cors = if state.config.server.dev_mode {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ])
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_credentials(true)
            .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn_with_state(state.clone(), security::api_rate_limit))
                .layer(from_fn_with_state(state.clone(), middleware::authenticate))
                .layer(from_fn_with_state(state.clone(), middleware::authorize)),
        )
        .with_state(state)
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] GatehouseError),

    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    #[error("Authentication setup error: {0}")]
    Auth(#[from] auth::AuthError),

    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging for the web server
pub fn init_logging(config: &LoggingConfig) -> WebResult<()> {
    gatehouse_core::init_logging(config).map_err(|e| WebError::Logging(e.to_string()))
}
