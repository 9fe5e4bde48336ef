use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::waiter::WaitConfig;

const CONFIG_FILENAME: &str = "config.toml";
const CONFIG_DIR: &str = ".corral";

fn default_warm_up_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_stability_threshold() -> u32 {
    5
}

fn default_ceiling_secs() -> u64 {
    600
}

fn default_capture_lines() -> u32 {
    80
}

fn default_program() -> String {
    "claude".to_string()
}

fn default_skip_permissions_flag() -> String {
    "--dangerously-skip-permissions".to_string()
}

/// Wait-loop tunables. These varied across deployments (5×2s vs 10s
/// stability, 10 vs 15 minute ceilings), so they are configuration with
/// documented defaults rather than constants.
///
/// ```toml
/// [wait]
/// warm_up_secs = 10
/// poll_interval_secs = 2
/// stability_threshold = 5
/// ceiling_secs = 600
/// capture_lines = 80
/// ```
#[derive(Debug, Deserialize)]
pub struct WaitSettings {
    #[serde(default = "default_warm_up_secs")]
    pub warm_up_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    #[serde(default = "default_ceiling_secs")]
    pub ceiling_secs: u64,
    #[serde(default = "default_capture_lines")]
    pub capture_lines: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            warm_up_secs: default_warm_up_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            stability_threshold: default_stability_threshold(),
            ceiling_secs: default_ceiling_secs(),
            capture_lines: default_capture_lines(),
        }
    }
}

/// The driven agent program and how to tell it to skip confirmation prompts.
#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_skip_permissions_flag")]
    pub skip_permissions_flag: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            skip_permissions_flag: default_skip_permissions_flag(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub wait: WaitSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl ProjectConfig {
    /// Search upward from `start` for a `.corral/config.toml` file and load
    /// it. Returns the default config if no file is found.
    pub fn load(start: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = Self::find_config_file(start) {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config: ProjectConfig = toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            Ok((config, Some(path)))
        } else {
            Ok((ProjectConfig::default(), None))
        }
    }

    fn find_config_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// The wait-loop configuration threaded into `waiter::wait`.
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig {
            warm_up: Duration::from_secs(self.wait.warm_up_secs),
            poll_interval: Duration::from_secs(self.wait.poll_interval_secs),
            stability_threshold: self.wait.stability_threshold,
            ceiling: Duration::from_secs(self.wait.ceiling_secs),
            capture_lines: self.wait.capture_lines,
        }
    }
}
