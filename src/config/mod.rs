pub mod runtime;
pub use runtime::{new_runtime_config, RuntimeConfig, SharedRuntimeConfig};

use crate::sensor::ChannelSet;
use serde::Deserialize;
use std::time::Duration;

/// Complete gateway configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Prediction backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Backend origin, e.g. "http://localhost:5000"
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Upper bound for a whole backend exchange (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Upper bound for establishing the connection (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Sensor schema configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorsConfig {
    #[serde(default)]
    pub channel_set: ChannelSet,
}

impl GatewayConfig {
    /// Apply environment overrides on top of file/default values.
    ///
    /// - `BACKEND_API_URL` → backend.url
    /// - `FRESHGATE_PORT` → server.port
    /// - `FRESHGATE_CHANNEL_SET` → sensors.channel_set
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with a custom variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BACKEND_API_URL").filter(|v| !v.trim().is_empty()) {
            self.backend.url = url;
        }
        if let Some(port) = lookup("FRESHGATE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("FRESHGATE_PORT must be a valid port number"))?;
        }
        if let Some(set) = lookup("FRESHGATE_CHANNEL_SET") {
            self.sensors.channel_set = set.parse().map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&contents)?;
    Ok(config)
}
