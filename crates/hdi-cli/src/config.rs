//! hdi CLI configuration stored at `~/.hdi/config.json`.
//!
//! Connection settings resolve in this order (highest priority first):
//! 1. Command line flags
//! 2. `HDI_*` environment variables (handled by clap's `env` support)
//! 3. `~/.hdi/config.json` (written by `hdi configure`)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use hdi_cluster::ReconcilerConfig;
use hdi_provider::http::DEFAULT_ENDPOINT;
use hdi_provider::{HttpClientConfig, PollConfig};

use crate::{Error, Result};

const CONFIG_DIR_NAME: &str = ".hdi";
const CONFIG_FILE_NAME: &str = "config.json";

/// Persistent CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HdiConfig {
    /// Subscription clusters live in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    /// Management endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Bearer token for the management endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Refuse to create over existing clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_import: Option<bool>,
    /// Seconds between operation status checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
    /// Upper bound in seconds on a single command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl HdiConfig {
    /// Overlay the values set in `other`
    pub fn merge(&mut self, other: HdiConfig) {
        if other.subscription_id.is_some() {
            self.subscription_id = other.subscription_id;
        }
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint;
        }
        if other.access_token.is_some() {
            self.access_token = other.access_token;
        }
        if other.require_import.is_some() {
            self.require_import = other.require_import;
        }
        if other.poll_interval_secs.is_some() {
            self.poll_interval_secs = other.poll_interval_secs;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }
}

/// Connection flags shared by every command that talks to the provider
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Subscription id
    #[arg(long, env = "HDI_SUBSCRIPTION_ID")]
    pub subscription_id: Option<String>,

    /// Management endpoint
    #[arg(long, env = "HDI_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the management endpoint
    #[arg(long, env = "HDI_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Refuse to create a cluster that already exists (default: true)
    #[arg(long, env = "HDI_REQUIRE_IMPORT")]
    pub require_import: Option<bool>,

    /// Seconds between operation status checks
    #[arg(long, env = "HDI_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    /// Give up after this many seconds
    #[arg(long, env = "HDI_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl ConnectionArgs {
    fn as_config(&self) -> HdiConfig {
        HdiConfig {
            subscription_id: self.subscription_id.clone(),
            endpoint: self.endpoint.clone(),
            access_token: self.access_token.clone(),
            require_import: self.require_import,
            poll_interval_secs: self.poll_interval_secs,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Fully resolved connection settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub http: HttpClientConfig,
    pub reconciler: ReconcilerConfig,
}

impl Settings {
    /// Resolve flags and environment over the stored configuration
    pub fn resolve(args: &ConnectionArgs, stored: HdiConfig) -> Result<Self> {
        let mut config = stored;
        config.merge(args.as_config());

        let subscription_id = config.subscription_id.ok_or_else(|| {
            Error::validation("no subscription id: pass --subscription-id or run `hdi configure`")
        })?;
        let access_token = config.access_token.ok_or_else(|| {
            Error::validation("no access token: pass --access-token or set HDI_ACCESS_TOKEN")
        })?;

        let mut http = HttpClientConfig::new(subscription_id, access_token);
        http.endpoint = config
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let mut poll = PollConfig::default();
        if let Some(secs) = config.poll_interval_secs {
            if secs == 0 {
                return Err(Error::validation("poll interval must be at least one second"));
            }
            poll.interval = Duration::from_secs(secs);
            poll.max_interval = poll.max_interval.max(poll.interval);
        }

        Ok(Self {
            http,
            reconciler: ReconcilerConfig {
                require_import: config.require_import.unwrap_or(true),
                poll,
                timeout: config.timeout_secs.map(Duration::from_secs),
            },
        })
    }

    /// Resolve against `~/.hdi/config.json`
    pub fn load(args: &ConnectionArgs) -> Result<Self> {
        Self::resolve(args, load_config()?)
    }
}

/// Returns `~/.hdi/`, creating it if it doesn't exist.
pub fn hdi_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::command_failed("could not determine home directory"))?;
    let dir = home.join(CONFIG_DIR_NAME);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::command_failed(format!("failed to create {}: {}", dir.display(), e))
        })?;
    }
    Ok(dir)
}

/// Path to `~/.hdi/config.json`.
pub fn config_path() -> Result<PathBuf> {
    Ok(hdi_dir()?.join(CONFIG_FILE_NAME))
}

/// Load config from `~/.hdi/config.json`, returning default if missing.
pub fn load_config() -> Result<HdiConfig> {
    load_config_from(&config_path()?)
}

/// Save config to `~/.hdi/config.json`.
pub fn save_config(config: &HdiConfig) -> Result<PathBuf> {
    let path = config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

/// Load config from a file, returning default if missing.
pub fn load_config_from(path: &Path) -> Result<HdiConfig> {
    if !path.exists() {
        return Ok(HdiConfig::default());
    }
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::command_failed(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&data)
        .map_err(|e| Error::command_failed(format!("failed to parse {}: {}", path.display(), e)))
}

/// Save config to a file.
pub fn save_config_to(path: &Path, config: &HdiConfig) -> Result<()> {
    let data = serde_json::to_string_pretty(config)
        .map_err(|e| Error::command_failed(format!("failed to serialize config: {}", e)))?;
    std::fs::write(path, data)
        .map_err(|e| Error::command_failed(format!("failed to write {}: {}", path.display(), e)))
}
