//! Gatehouse Web Server
//!
//! Role-based administration backend.

use anyhow::Context;
use clap::Parser;
use gatehouse_core::GatehouseConfig;
use gatehouse_web::{init_logging, GatehouseServerBuilder};
use std::path::PathBuf;
use tracing::info;

/// Gatehouse Web Server - role-based administration backend
#[derive(Parser)]
#[command(name = "gatehouse-web")]
#[command(about = "Role-based administration backend")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut GatehouseConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.dev {
            config.server.dev_mode = true;
        }
        if let Some(level) = self.log_level {
            config.logging = config.logging.clone().with_level(&level);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let mut config = GatehouseConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!("Starting Gatehouse Web Server initialization");

    let server = GatehouseServerBuilder::new()
        .config(config)
        .build()
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["gatehouse-web"]);
        assert!(args.host.is_none());
        assert!(args.port.is_none());
        assert!(!args.dev);

        let args = Args::parse_from([
            "gatehouse-web",
            "--host",
            "0.0.0.0",
            "--port",
            "3000",
            "--dev",
            "--log-level",
            "debug",
        ]);
        let mut config = GatehouseConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.dev_mode);
        assert_eq!(config.logging.level, "debug");
    }
}
