//! Gatehouse Web Server
//!
//! Binds the listener, runs the maintenance sweeper alongside the router and
//! shuts both down on ctrl-c.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use gatehouse_core::GatehouseConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main Gatehouse web server
pub struct GatehouseServer {
    state: AppState,
}

impl GatehouseServer {
    pub fn new(config: GatehouseConfig) -> WebResult<Self> {
        config.validate()?;
        let state = AppState::new(config)?;
        Ok(Self { state })
    }

    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Start the web server; returns after graceful shutdown
    pub async fn start(self) -> WebResult<()> {
        let config = &self.state.config;
        let address = config.address();

        info!("Starting Gatehouse Web Server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", config.server.dev_mode);

        let app = create_app(self.state.clone());
        let listener = TcpListener::bind(&address).await.map_err(WebError::Server)?;
        info!("Server listening on http://{}", address);

        let sweeper = self.state.sweeper().spawn();

        let result = serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        sweeper.stop().await;

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down gracefully");
        Ok(())
    }

    pub fn config(&self) -> &GatehouseConfig {
        &self.state.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for GatehouseServer
pub struct GatehouseServerBuilder {
    config: GatehouseConfig,
}

impl GatehouseServerBuilder {
    pub fn new() -> Self {
        Self {
            config: GatehouseConfig::default(),
        }
    }

    pub fn config(mut self, config: GatehouseConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    /// Set the token signing secret
    pub fn jwt_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.config.auth.jwt_secret = Some(secret.into());
        self
    }

    /// Validate the configuration and build the server
    pub fn build(self) -> WebResult<GatehouseServer> {
        GatehouseServer::new(self.config)
    }
}

impl Default for GatehouseServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
