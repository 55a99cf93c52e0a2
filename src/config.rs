//! Configuration management for Manifest Patcher
//!
//! This module provides TOML configuration with first-run initialization, a
//! fixed search order, and write-back so options added by newer releases show up
//! in existing files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::client::ClientConfig;
use crate::app::models::SyncRoots;
use crate::app::reconcile::EngineConfig;
use crate::constants::{config, http};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Remote and local roots
    pub sync: SyncConfigToml,
    /// Prompt and verbosity switches
    pub behavior: BehaviorConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Self-update check
    pub self_update: SelfUpdateConfig,
}

/// TOML-friendly sync roots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfigToml {
    /// Remote host, optionally with scheme and path
    pub remote_root: String,
    /// Remote port
    pub remote_port: u16,
    /// Local directory mirrored from the remote root
    pub local_root: PathBuf,
}

impl Default for SyncConfigToml {
    fn default() -> Self {
        Self {
            remote_root: config::DEFAULT_REMOTE_ROOT.to_string(),
            remote_port: config::DEFAULT_REMOTE_PORT,
            local_root: PathBuf::from(config::DEFAULT_LOCAL_ROOT),
        }
    }
}

/// Behavior switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Per-file progress and notices
    pub verbose: bool,
    /// Debug logging
    pub debug: bool,
    /// Do not ask for confirmation before synchronizing
    pub skip_prompt: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            debug: false,
            skip_prompt: false,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Request timeout, e.g. "5m"
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout, e.g. "30s"
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Override of the user agent
    pub user_agent: Option<String>,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            tcp_nodelay: true,
            user_agent: None,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            tcp_nodelay: self.tcp_nodelay,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent.clone()),
            ..defaults
        }
    }
}

/// Self-update check settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SelfUpdateConfig {
    /// README whose first line is `{"version": [x, y, z]}`
    pub readme_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the explicit path or the first file found in the
    /// standard locations
    ///
    /// Returns `Ok(None)` when no configuration file exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if an explicit path does not exist, or the
    /// read/parse error of the file found.
    pub async fn load(
        config_file_override: Option<PathBuf>,
    ) -> ConfigResult<Option<(Self, PathBuf)>> {
        let config_path = match config_file_override {
            Some(path) if path.exists() => path,
            Some(path) => return Err(ConfigError::NotFound { path }),
            None => match Self::find_config_file(&Self::search_paths()) {
                Some(path) => path,
                None => return Ok(None),
            },
        };

        let config = Self::load_from_file(&config_path).await?;
        Ok(Some((config, config_path)))
    }

    /// Standard locations, in precedence order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".").join(config::FILE_NAME),
            PathBuf::from(".").join(config::ALT_FILE_NAME),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(config::APP_DIR).join("config.toml"));
        }
        paths
    }

    /// First existing path of `search_paths`
    pub fn find_config_file(search_paths: &[PathBuf]) -> Option<PathBuf> {
        let found = search_paths.iter().find(|path| path.is_file()).cloned();
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write the configuration back to `path`
    pub async fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Write the commented default configuration to `path`
    ///
    /// Existing files are left untouched.
    pub async fn initialize_first_run(path: &Path) -> ConfigResult<()> {
        if path.exists() {
            return Ok(());
        }

        info!("Creating default configuration file...");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Location written by `initialize_first_run` when no file exists
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(".").join(config::FILE_NAME)
    }

    /// Reject values that can never work
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sync.remote_root.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sync.remote_root".to_string(),
                value: self.sync.remote_root.clone(),
                reason: "Remote root must not be empty".to_string(),
            });
        }
        if self.sync.local_root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sync.local_root".to_string(),
                value: String::new(),
                reason: "Local root must not be empty".to_string(),
            });
        }
        if self.sync.remote_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.remote_port".to_string(),
                value: "0".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }
        Ok(())
    }

    /// Build the roots for this run
    pub fn sync_roots(&self) -> ConfigResult<SyncRoots> {
        SyncRoots::new(
            &self.sync.remote_root,
            Some(self.sync.remote_port),
            &self.sync.local_root,
        )
        .map_err(|e| ConfigError::InvalidValue {
            field: "sync.remote_root".to_string(),
            value: self.sync.remote_root.clone(),
            reason: e.to_string(),
        })
    }

    /// Runtime HTTP client configuration
    pub fn client_config(&self) -> ClientConfig {
        self.client.to_runtime_config()
    }

    /// Runtime engine configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            verbose: self.behavior.verbose,
        }
    }

    /// README location for the self-update check, if configured
    pub fn readme_url(&self) -> ConfigResult<Option<Url>> {
        self.self_update
            .readme_url
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                    field: "self_update.readme_url".to_string(),
                    value: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Manifest Patcher Configuration
# This file was automatically generated on first run.
# Point [sync] at your patch server, then run the patcher again.

[sync]
# Patch server host, optionally with scheme ("https://...") and path
remote_root = "{}"
remote_port = {}
# Directory that is kept in sync with the server
local_root = "{}"

[behavior]
# Show per-file progress
verbose = true
# Debug logging
debug = false
# Start without asking for confirmation
skip_prompt = false

[client]
# HTTP client settings
request_timeout = "5m"
connect_timeout = "30s"
tcp_nodelay = true
# user_agent = "Manifest-Patcher"

[self_update]
# README whose first line is {{"version": [1, 0, 5]}}
# readme_url = "https://example.com/patcher/README.md"
"#,
            config::DEFAULT_REMOTE_ROOT,
            config::DEFAULT_REMOTE_PORT,
            config::DEFAULT_LOCAL_ROOT,
        )
    }
}
