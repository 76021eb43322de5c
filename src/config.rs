//! Runtime adapter configuration.
//!
//! [`RuntimeConfig`] is built once at startup and shared read-only (behind an
//! `Arc`) by every launch and signal call. It can be constructed in code or
//! loaded from TOML:
//!
//! ```toml
//! container_executor_path = "/opt/hadoop/bin/container-executor"
//! tmp_dir = "/var/tmp/hadoop-yarn"
//! cgroup_hierarchy = "hadoop-yarn"
//! cgroup_parent_enabled = false
//! ```

use crate::constants::{DEFAULT_CGROUP_HIERARCHY, DEFAULT_CONTAINER_EXECUTOR_PATH};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the YARN install root.
const YARN_HOME_ENV: &str = "HADOOP_YARN_HOME";

/// Immutable adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Privileged helper binary.
    pub container_executor_path: PathBuf,
    /// Base temp directory; docker command files go in a subdirectory.
    pub tmp_dir: PathBuf,
    /// cgroup hierarchy used to compute container cgroup parents.
    pub cgroup_hierarchy: String,
    /// Attach a docker `--cgroup-parent` on launch. Off by default.
    pub cgroup_parent_enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let yarn_home = std::env::var_os(YARN_HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_default();

        Self {
            container_executor_path: yarn_home.join(DEFAULT_CONTAINER_EXECUTOR_PATH),
            tmp_dir: std::env::temp_dir(),
            cgroup_hierarchy: DEFAULT_CGROUP_HIERARCHY.to_string(),
            cgroup_parent_enabled: false,
        }
    }
}

impl RuntimeConfig {
    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    /// Checks values that would only fail later, at launch time.
    pub fn validate(&self) -> Result<()> {
        if self.container_executor_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "container_executor_path must not be empty".to_string(),
            ));
        }
        if self.cgroup_hierarchy.trim_matches('/').is_empty() {
            return Err(Error::Config("cgroup_hierarchy must not be empty".to_string()));
        }
        Ok(())
    }
}
