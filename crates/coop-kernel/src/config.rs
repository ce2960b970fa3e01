//! Kernel configuration
//!
//! Loaded from JSON; every field has a default so partial files work.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::memory::DEFAULT_PAGE_SIZE;

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// PID given to the first spawned process
    pub first_pid: u64,

    /// Page size used by paging demos and `AddressSpace::touched_pages`
    pub page_size: u64,

    /// Working directory at boot (host current directory if unset)
    pub initial_cwd: Option<PathBuf>,

    /// Cycle budget for `Kernel::run` when the caller gives none
    pub default_cycles: u64,

    /// Log every context switch in the run loop
    pub trace_context_switches: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            first_pid: 0,
            page_size: DEFAULT_PAGE_SIZE,
            initial_cwd: None,
            default_cycles: 100,
            trace_context_switches: true,
        }
    }
}

impl KernelConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Builder-style working directory override
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.initial_cwd = Some(cwd.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = KernelConfig::default();
        assert_eq!(config.first_pid, 0);
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.default_cycles, 100);
        assert!(config.initial_cwd.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: KernelConfig = serde_json::from_str(r#"{ "first_pid": 10 }"#).unwrap();
        assert_eq!(config.first_pid, 10);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.trace_context_switches);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = tempdir().unwrap();
        let config_path = tmp.path().join("kernel.json");

        let config = KernelConfig {
            default_cycles: 7,
            trace_context_switches: false,
            ..KernelConfig::default()
        }
        .with_cwd(tmp.path());
        config.save(&config_path).unwrap();

        let loaded = KernelConfig::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let tmp = tempdir().unwrap();
        let config_path = tmp.path().join("bad.json");
        fs::write(&config_path, "not json").unwrap();

        assert!(matches!(
            KernelConfig::load(&config_path),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            KernelConfig::load(tmp.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
