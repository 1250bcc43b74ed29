//! Linflow Configuration Module
//!
//! Runner defaults for exec tasks.
//! Config is stored in `~/.config/linflow/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`LINFLOW_SHELL`, `LINFLOW_EXEC_TIMEOUT`)
//! 2. Config file (`--config <path>` or `~/.config/linflow/config.toml`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LinflowError, Result};

/// Default shell for exec tasks
pub const DEFAULT_SHELL: &str = "sh";
/// Default timeout for exec tasks (60 seconds)
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 60;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinflowConfig {
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Exec task settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// Shell used as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Per-task timeout unless the task sets its own
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

fn default_exec_timeout_secs() -> u64 {
    DEFAULT_EXEC_TIMEOUT_SECS
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            exec_timeout_secs: default_exec_timeout_secs(),
        }
    }
}

impl RunnerConfig {
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }
}

impl LinflowConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/linflow/` on Unix, `%APPDATA%/linflow/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linflow")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration, then apply environment overrides
    ///
    /// An explicit path must exist. The default path may be absent, in which
    /// case defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) if !path.exists() => {
                return Err(LinflowError::ConfigError {
                    reason: format!("Config file not found: {}", path.display()),
                })
            }
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Parse a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LinflowError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| LinflowError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Apply `LINFLOW_*` overrides looked up through `lookup`
    ///
    /// Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(shell) = lookup("LINFLOW_SHELL").filter(|s| !s.is_empty()) {
            self.runner.shell = shell;
        }

        if let Some(raw) = lookup("LINFLOW_EXEC_TIMEOUT").filter(|s| !s.is_empty()) {
            self.runner.exec_timeout_secs =
                raw.trim().parse().map_err(|_| LinflowError::ConfigError {
                    reason: format!("LINFLOW_EXEC_TIMEOUT must be whole seconds, got '{}'", raw),
                })?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_config_path_contains_linflow() {
        let path = LinflowConfig::config_path();
        assert!(path.to_string_lossy().contains("linflow"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_defaults() {
        let config = LinflowConfig::default();
        assert_eq!(config.runner.shell, "sh");
        assert_eq!(config.runner.exec_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[runner]\nexec_timeout_secs = 5\n").unwrap();

        let config = LinflowConfig::load_from(&path).unwrap();
        assert_eq!(config.runner.exec_timeout_secs, 5);
        assert_eq!(config.runner.shell, "sh");
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[runner\n").unwrap();

        let err = LinflowConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, LinflowError::ConfigError { .. }));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let err = LinflowConfig::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = LinflowConfig::default()
            .with_overrides(env(&[
                ("LINFLOW_SHELL", "bash"),
                ("LINFLOW_EXEC_TIMEOUT", "7"),
            ]))
            .unwrap();
        assert_eq!(config.runner.shell, "bash");
        assert_eq!(config.runner.exec_timeout_secs, 7);
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = LinflowConfig::default()
            .with_overrides(env(&[("LINFLOW_SHELL", "")]))
            .unwrap();
        assert_eq!(config.runner.shell, "sh");
    }

    #[test]
    fn test_bad_timeout_env_is_error() {
        let err = LinflowConfig::default()
            .with_overrides(env(&[("LINFLOW_EXEC_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(err, LinflowError::ConfigError { .. }));
    }
}
