use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use consent_core::EngineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),
    #[error("config parse error: {0}")]
    ParseError(String),
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Which authorization plugin the responder runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorizerKind {
    /// Accept every transaction without asking
    #[default]
    AlwaysAccept,
    /// Ask the data owner through a notification server
    Notification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub bind_addr: String,
    pub log_level: String,

    /// Where the responder publishes its main public key
    pub key_file: Option<PathBuf>,

    // Plugins
    pub authorizer: AuthorizerKind,
    pub notification_url: Option<String>,
    pub poll_interval_ms: u64,
    pub poll_attempts: u32,
    pub data_service_url: Option<String>,

    // Engine
    pub intake_capacity: usize,
    pub authorization_timeout_secs: u64,
    pub single_use_transactions: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            bind_addr: "127.0.0.1:5050".to_string(),
            log_level: "info".to_string(),
            key_file: None,
            authorizer: AuthorizerKind::AlwaysAccept,
            notification_url: None,
            poll_interval_ms: 1000,
            poll_attempts: 120,
            data_service_url: None,
            intake_capacity: engine.intake_capacity,
            authorization_timeout_secs: engine.authorization_timeout.as_secs(),
            single_use_transactions: engine.single_use_transactions,
        }
    }
}

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_addr: Option<String>,
    pub log_level: Option<String>,
    pub key_file: Option<PathBuf>,
    pub authorizer: Option<AuthorizerKind>,
    pub notification_url: Option<String>,
    pub data_service_url: Option<String>,
}

impl NodeConfig {
    /// Parse a TOML file. Not validated: overrides may still complete it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let config: NodeConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn load_from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply `CONSENT_*` and `RUST_LOG` overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("CONSENT_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(url) = lookup("CONSENT_DATA_SERVICE_URL") {
            self.data_service_url = Some(url);
        }
        if let Some(url) = lookup("CONSENT_NOTIFICATION_URL") {
            self.notification_url = Some(url);
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = level;
        }
        self
    }

    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(addr) = &overrides.bind_addr {
            self.bind_addr = addr.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
        if let Some(path) = &overrides.key_file {
            self.key_file = Some(path.clone());
        }
        if let Some(kind) = overrides.authorizer {
            self.authorizer = kind;
        }
        if let Some(url) = &overrides.notification_url {
            self.notification_url = Some(url.clone());
        }
        if let Some(url) = &overrides.data_service_url {
            self.data_service_url = Some(url.clone());
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::ValidationError(format!("bind_addr '{}' is not an address: {}", self.bind_addr, e))
        })?;
        if self.intake_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "intake_capacity must be at least 1".to_string(),
            ));
        }
        if self.authorization_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "authorization_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.authorizer == AuthorizerKind::Notification {
            if self.notification_url.is_none() {
                return Err(ConfigError::ValidationError(
                    "notification authorizer needs notification_url".to_string(),
                ));
            }
            if self.poll_interval_ms == 0 || self.poll_attempts == 0 {
                return Err(ConfigError::ValidationError(
                    "poll_interval_ms and poll_attempts must be at least 1".to_string(),
                ));
            }
            if self.poll_window() > self.authorization_timeout() {
                return Err(ConfigError::ValidationError(
                    "authorization_timeout_secs must cover the notification poll window".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_window(&self) -> Duration {
        self.poll_interval() * self.poll_attempts
    }

    pub fn authorization_timeout(&self) -> Duration {
        Duration::from_secs(self.authorization_timeout_secs)
    }

    pub fn key_file(&self) -> PathBuf {
        self.key_file
            .clone()
            .unwrap_or_else(consent_core::key_store::FileKeyStore::default_path)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            intake_capacity: self.intake_capacity,
            authorization_timeout: self.authorization_timeout(),
            single_use_transactions: self.single_use_transactions,
        }
    }
}
