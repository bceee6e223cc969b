//! Configuration management

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::connection::Connection;
use crate::error::{Error, Result};

pub const ENV_API_KEY: &str = "EPISODIC_API_KEY";
pub const ENV_SECRET_KEY: &str = "EPISODIC_SECRET_KEY";
pub const ENV_API_HOST: &str = "EPISODIC_API_HOST";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    // Unset means the production Platform
    #[serde(default)]
    pub api_host: Option<String>,
    // Wait for response headers of a query or report request. Uploads wait
    // as long as the transfer takes.
    #[serde(default = "default_response_timeout", alias = "timeout_secs")]
    pub response_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    // Largest response body read, reports included
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_response_timeout() -> u64 { 60 }
fn default_connect_timeout() -> u64 { 30 }
fn default_max_response_bytes() -> u64 { 64 * 1024 * 1024 }
fn default_user_agent() -> String {
    format!("episodic-platform-rs/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            api_host: None,
            response_timeout_secs: default_response_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("episodic_platform");
        path.push("config.json");
        path
    }

    /// Read the user's config file, falling back to defaults when it is
    /// missing or unreadable. Environment overrides are applied on top.
    pub fn load() -> Self {
        let path = Self::config_path();

        let mut config = if path.exists() {
            Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        };

        config.apply_env();
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Override credentials and host from `EPISODIC_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(secret) = get(ENV_SECRET_KEY) {
            self.secret_key = secret;
        }
        if let Some(host) = get(ENV_API_HOST) {
            self.api_host = Some(host);
        }
    }

    /// The connection these settings describe. Fails without credentials.
    pub fn connection(&self) -> Result<Connection> {
        if self.api_key.is_empty() || self.secret_key.is_empty() {
            return Err(Error::Config("api_key and secret_key must be set".to_string()));
        }
        let connection = Connection::new(&self.api_key, &self.secret_key);
        Ok(match &self.api_host {
            Some(host) if !host.is_empty() => connection.with_host(host),
            _ => connection,
        })
    }
}
