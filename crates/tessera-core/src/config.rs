//! Operator configuration for the placement core.
//!
//! Loaded from a TOML file. Every field carries a default, so an empty
//! file (or no file at all) yields the stock behavior.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Role every resource manager hands out to unreserved resources.
pub const DEFAULT_ROLE: &str = "*";

/// Executor string that selects the built-in command executor.
pub const COMMAND_EXECUTOR: &str = "//cmd";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("default_accepted_resource_roles must not be empty")]
    EmptyDefaultRoles,
    #[error("executor must not be empty")]
    EmptyExecutor,
}

/// How disk requirements are declared to the resource manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskPolicy {
    /// Skip disk entirely when the workload declares `disk = 0`.
    /// Older resource managers mishandle zero-sized disk reservations.
    #[default]
    OmitWhenZero,
    /// Always match and attach disk, even for a zero requirement.
    AlwaysDeclare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Roles a workload may consume when it names none itself.
    pub default_accepted_resource_roles: BTreeSet<String>,
    /// Executor used when a workload leaves `executor` empty.
    pub executor: String,
    /// Prefix applied to the `PORT*` and `HOST` variables.
    pub env_vars_prefix: Option<String>,
    pub disk_policy: DiskPolicy,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_accepted_resource_roles: BTreeSet::from([DEFAULT_ROLE.to_string()]),
            executor: COMMAND_EXECUTOR.to_string(),
            env_vars_prefix: None,
            disk_policy: DiskPolicy::default(),
        }
    }
}

impl PlacementConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: PlacementConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_accepted_resource_roles.is_empty() {
            return Err(ConfigError::EmptyDefaultRoles);
        }
        if self.executor.trim().is_empty() {
            return Err(ConfigError::EmptyExecutor);
        }
        Ok(())
    }

    /// Whether disk takes part in matching for a workload declaring `disk`.
    pub fn declares_disk(&self, disk: f64) -> bool {
        match self.disk_policy {
            DiskPolicy::OmitWhenZero => disk != 0.0,
            DiskPolicy::AlwaysDeclare => true,
        }
    }
}
