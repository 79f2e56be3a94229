use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_DIR: &str = "reqour";
const CONFIG_FILE: &str = "worker.toml";
const DEFAULT_CALLBACK_METHOD: &str = "POST";
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub callback: CallbackConfig,
    pub process: ProcessConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    /// HTTP method used when none is given on the command line.
    pub method: String,
    /// Upper bound for a whole callback request, connect included.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Variables added on top of the worker's own environment for every command.
    pub env: HashMap<String, String>,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_CALLBACK_METHOD.to_string(),
            timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
        }
    }
}

impl CallbackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl WorkerConfig {
    /// `$XDG_CONFIG_HOME/reqour/worker.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the configuration.
    ///
    /// An explicit path must be readable. Without one, the default location is
    /// tried and a missing file falls back to defaults.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::read(path).await?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path).await?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    async fn read(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.callback.method.trim().is_empty() {
            bail!("callback.method must not be blank");
        }
        if self.callback.timeout_secs == 0 {
            bail!("callback.timeout_secs must be greater than zero");
        }
        if self.process.env.keys().any(|k| k.is_empty() || k.contains('=')) {
            bail!("process.env keys must be non-empty and must not contain '='");
        }
        Ok(())
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}
