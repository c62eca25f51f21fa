//! Process-wide configuration.
//!
//! Assembled once at startup from an optional YAML file plus environment
//! overrides, then shared read-only (`Arc<Config>`) with every service.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Which services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// HTTP front end and storage listener side by side
    Both,
    /// HTTP front end only
    Http,
    /// Storage listener only
    Storage,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(Role::Both),
            "http" => Ok(Role::Http),
            "storage" => Ok(Role::Storage),
            other => anyhow::bail!("unknown role {:?} (expected both, http or storage)", other),
        }
    }
}

impl Role {
    pub fn runs_http(&self) -> bool {
        matches!(self, Role::Both | Role::Http)
    }

    pub fn runs_storage(&self) -> bool {
        matches!(self, Role::Both | Role::Storage)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub role: Role,
    pub log_level: String,
    pub http: HttpConfig,
    pub assets: AssetsConfig,
    pub relay: RelayConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen_addr: String,
    /// Connections handled concurrently; further accepts wait for a free slot.
    pub max_connections: usize,
}

/// Location of the template and static files served by the front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the storage listener binds.
    pub listen_addr: String,
    /// Address the relay client connects to.
    pub peer_addr: String,
    pub timeout_secs: u64,
    pub max_connections: usize,
    pub max_message_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub connect_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: Role::Both,
            log_level: "info".to_string(),
            http: HttpConfig::default(),
            assets: AssetsConfig::default(),
            relay: RelayConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            max_connections: 256,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            peer_addr: "127.0.0.1:5000".to_string(),
            timeout_secs: 5,
            max_connections: 64,
            max_message_bytes: 64 * 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://mongodb:27017/".to_string(),
            database: "messages_db".to_string(),
            collection: "messages".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

impl AssetsConfig {
    /// Path of a document under `templates/`.
    pub fn template(&self, name: &str) -> PathBuf {
        self.root.join("templates").join(name)
    }

    /// Path of a file directly under the assets root.
    pub fn file(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StorageConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Config {
    /// Loads the YAML file named by `CONFIG` (default `config.yaml`) and
    /// applies environment overrides. A missing file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        let mut cfg = Self::from_file(Path::new(&path))?;
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies the environment-style overrides returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(role) = lookup("ROLE") {
            self.role = role.parse().context("Invalid ROLE override")?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(addr) = lookup("HTTP_LISTEN") {
            self.http.listen_addr = addr;
        }
        if let Some(root) = lookup("ASSETS_ROOT") {
            self.assets.root = PathBuf::from(root);
        }
        if let Some(addr) = lookup("RELAY_LISTEN") {
            self.relay.listen_addr = addr;
        }
        if let Some(addr) = lookup("RELAY_PEER") {
            self.relay.peer_addr = addr;
        }
        if let Some(uri) = lookup("MONGO_URI") {
            self.storage.uri = uri;
        }
        Ok(())
    }

    /// Maximum log level, falling back to INFO on an unrecognized value.
    pub fn log_level(&self) -> tracing::Level {
        self.log_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}
