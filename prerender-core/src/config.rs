// Mirror configuration: the target origin and where the mirror is written

use crate::error::{MirrorError, Result};
use prerender_scanner::crawler::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_OUTPUT_DIR: &str = "./dist";

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub target_url: Url,
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl MirrorConfig {
    pub fn new(target_url: Url) -> Self {
        Self {
            target_url,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Output directory with a leading `~` expanded.
    pub fn expanded_output_dir(&self) -> PathBuf {
        let raw = self.output_dir.to_string_lossy();
        PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
    }

    pub fn validate(&self) -> Result<()> {
        match self.target_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(MirrorError::Config(format!(
                    "target_url must be http or https, got {}",
                    other
                )));
            }
        }
        if self.target_url.host_str().is_none() {
            return Err(MirrorError::Config(format!(
                "target_url {} has no host",
                self.target_url
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(MirrorError::Config("output_dir must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(MirrorError::Config("timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Settings as read from a config file or the command line, before defaults
/// are applied. Both `snake_case` and `camelCase` keys are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(default, alias = "targetUrl")]
    pub target_url: Option<Url>,
    #[serde(default, alias = "outputDir")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, alias = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
    #[serde(default, alias = "userAgent")]
    pub user_agent: Option<String>,
}

impl PartialConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MirrorError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: PartialConfig) -> Self {
        Self {
            target_url: overrides.target_url.or(self.target_url),
            output_dir: overrides.output_dir.or(self.output_dir),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            user_agent: overrides.user_agent.or(self.user_agent),
        }
    }

    pub fn build(self) -> Result<MirrorConfig> {
        let target_url = self
            .target_url
            .ok_or_else(|| MirrorError::Config("No target URL was given".to_string()))?;

        let mut config = MirrorConfig::new(target_url);
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }

        config.validate()?;
        Ok(config)
    }
}
