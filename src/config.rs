use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::schedule::Account;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScuttlebuttConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub github: GitHubConfig,
    pub source: SourceConfig,
    pub notify: NotifyConfig,
    /// Notification accounts, one `[[account]]` table each.
    #[serde(rename = "account")]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    /// Search endpoint. Polling is disabled when empty.
    pub url: String,
    pub token: Option<String>,
    pub query: String,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotifyConfig {
    /// Minimum time between two notifications from the same account.
    pub interval_secs: u64,
    /// How often the notifier wakes up to look for due accounts.
    pub check_interval_secs: u64,
}

impl Default for ScuttlebuttConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            github: GitHubConfig::default(),
            source: SourceConfig::default(),
            notify: NotifyConfig::default(),
            accounts: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".into(),
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_scuttlebutt_dir()
            .join("scuttlebutt.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            token: None,
            timeout_secs: 10,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: None,
            query: "github.com".into(),
            poll_interval_secs: 30,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            interval_secs: 4 * 60 * 60,
            check_interval_secs: 30 * 60,
        }
    }
}

impl NotifyConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }
}

impl SourceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Returns `~/.scuttlebutt/`, or `./.scuttlebutt/` when there is no home directory.
pub fn default_scuttlebutt_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".scuttlebutt")
}

/// Returns the default config file path: `~/.scuttlebutt/config.toml`
pub fn default_config_path() -> PathBuf {
    default_scuttlebutt_dir().join("config.toml")
}

impl ScuttlebuttConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ScuttlebuttConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (SCUTTLEBUTT_DB, SCUTTLEBUTT_LOG_LEVEL,
    /// SCUTTLEBUTT_GITHUB_TOKEN, SCUTTLEBUTT_ADDR).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCUTTLEBUTT_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("SCUTTLEBUTT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SCUTTLEBUTT_GITHUB_TOKEN") {
            self.github.token = Some(val);
        }
        if let Ok(val) = std::env::var("SCUTTLEBUTT_ADDR") {
            self.server.addr = val;
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for account in &self.accounts {
            anyhow::ensure!(!account.username.is_empty(), "account with empty username");
            anyhow::ensure!(
                seen.insert(account.username.as_str()),
                "duplicate account {:?}",
                account.username
            );
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
