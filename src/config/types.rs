use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reported by the health endpoint.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_cors_max_age")]
    pub cors_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_max_age_secs: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgrest,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Project URL of the managed backend, without the `/rest/v1` suffix.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: None,
            api_key: None,
            request_timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    /// Overlay `MARKET_*` variables read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("MARKET_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MARKET_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| MarketError::Config(format!("MARKET_PORT inválido: '{port}'")))?;
        }
        if let Some(env) = lookup("MARKET_ENVIRONMENT") {
            self.server.environment = env;
        }
        if let Some(url) = lookup("MARKET_STORAGE_URL") {
            self.storage.url = Some(url);
            self.storage.backend = StorageBackend::Postgrest;
        }
        if let Some(key) = lookup("MARKET_STORAGE_KEY") {
            self.storage.api_key = Some(key);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::Postgrest {
            let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
            if blank(&self.storage.url) {
                return Err(MarketError::Config(
                    "storage.url is required for the postgrest backend".into(),
                ));
            }
            if blank(&self.storage.api_key) {
                return Err(MarketError::Config(
                    "storage.api_key is required for the postgrest backend".into(),
                ));
            }
        }
        if self.storage.request_timeout_secs == 0 {
            return Err(MarketError::Config(
                "storage.request_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_environment() -> String {
    "development".into()
}

fn default_cors_max_age() -> u64 {
    86400
}

fn default_timeout() -> u64 {
    30
}
