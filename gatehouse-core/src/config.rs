//! Configuration management
//!
//! Sources are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Command-line flags are applied last by the binary.

use crate::error::{ErrorContext, GatehouseError, GatehouseResult};
use crate::logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Minimum signing secret length outside dev mode, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Secret used when dev mode runs without `JWT_SECRET`
const DEV_SECRET: &str = "gatehouse-dev-secret-do-not-use-in-production";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatehouseConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens
    pub jwt_secret: Option<String>,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub session_idle_secs: u64,
    pub session_cookie: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 30 * 24 * 3600,
            session_idle_secs: 30 * 60,
            session_cookie: "GATEHOUSE_SESSION".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

/// Capacity and refill of one rate-limit policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub capacity: u32,
    /// Tokens added per refill period
    pub refill_tokens: u32,
    pub refill_period_secs: u64,
}

impl PolicyConfig {
    pub const fn per_minute(tokens: u32) -> Self {
        Self {
            capacity: tokens,
            refill_tokens: tokens,
            refill_period_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub login: PolicyConfig,
    pub api: PolicyConfig,
    /// How often idle buckets and expired sessions are swept
    pub sweep_interval_secs: u64,
    /// Buckets untouched for longer than this are evicted
    pub idle_retention_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: PolicyConfig::per_minute(5),
            api: PolicyConfig::per_minute(100),
            sweep_interval_secs: 5 * 60,
            idle_retention_secs: 60 * 60,
        }
    }
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn idle_retention(&self) -> Duration {
        Duration::from_secs(self.idle_retention_secs)
    }
}

impl GatehouseConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GatehouseResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GatehouseError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: GatehouseConfig =
            toml::from_str(&content).map_err(|e| GatehouseError::Config {
                message: format!("Failed to parse config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("parse_toml")
                    .with_suggestion("Check TOML syntax in config file"),
            })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GatehouseResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| GatehouseError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| GatehouseError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Defaults, overlaid with the file (if any) and then the process environment
    pub fn load(path: Option<&Path>) -> GatehouseResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) -> GatehouseResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> GatehouseResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GATEHOUSE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("GATEHOUSE_PORT") {
            self.server.port = parse_var("GATEHOUSE_PORT", &port)?;
        }
        if let Some(dev) = lookup("GATEHOUSE_DEV_MODE") {
            self.server.dev_mode = matches!(dev.trim(), "1" | "true" | "TRUE" | "yes");
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(ttl) = lookup("GATEHOUSE_ACCESS_TOKEN_TTL_SECS") {
            self.auth.access_token_ttl_secs = parse_var("GATEHOUSE_ACCESS_TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(ttl) = lookup("GATEHOUSE_REFRESH_TOKEN_TTL_SECS") {
            self.auth.refresh_token_ttl_secs =
                parse_var("GATEHOUSE_REFRESH_TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(idle) = lookup("GATEHOUSE_SESSION_IDLE_SECS") {
            self.auth.session_idle_secs = parse_var("GATEHOUSE_SESSION_IDLE_SECS", &idle)?;
        }
        Ok(())
    }

    /// Signing secret in effect, falling back to a fixed secret in dev mode
    pub fn signing_secret(&self) -> GatehouseResult<String> {
        match &self.auth.jwt_secret {
            Some(secret) if !secret.is_empty() => Ok(secret.clone()),
            _ if self.server.dev_mode => Ok(DEV_SECRET.to_string()),
            _ => Err(crate::config_error!(
                "JWT_SECRET is not set".to_string(),
                "signing_secret",
                "Set JWT_SECRET or run with --dev",
            )),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> GatehouseResult<()> {
        if !self.server.dev_mode {
            let secret = self.signing_secret()?;
            if secret.len() < MIN_SECRET_LEN {
                return Err(crate::config_error!(
                    format!(
                        "JWT_SECRET must be at least {} bytes, got {}",
                        MIN_SECRET_LEN,
                        secret.len()
                    ),
                    "validate",
                    "Generate a longer random secret",
                ));
            }
        }

        for (name, policy) in [("login", &self.rate_limit.login), ("api", &self.rate_limit.api)] {
            if policy.capacity == 0 {
                return Err(crate::config_error!(
                    format!("Rate limit policy '{}' must have a capacity greater than 0", name),
                    "validate",
                    "Set rate_limit.<policy>.capacity to a positive value",
                ));
            }
            if policy.refill_tokens == 0 || policy.refill_period_secs == 0 {
                return Err(crate::config_error!(
                    format!("Rate limit policy '{}' must refill at a positive rate", name),
                    "validate",
                    "Set refill_tokens and refill_period_secs to positive values",
                ));
            }
        }

        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(crate::config_error!(
                "Sweep interval must be greater than 0".to_string(),
                "validate",
                "Set rate_limit.sweep_interval_secs to a positive value",
            ));
        }

        if self.auth.access_token_ttl_secs == 0 || self.auth.session_idle_secs == 0 {
            return Err(crate::config_error!(
                "Token and session lifetimes must be greater than 0".to_string(),
                "validate",
                "Check the auth section",
            ));
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> GatehouseResult<T> {
    value.trim().parse().map_err(|_| {
        crate::config_error!(
            format!("Invalid value for {}: {}", key, value),
            "apply_env",
            "Check the environment variable format",
        )
    })
}
