//! Gateway configuration loader.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use sysgate_executor::{Executor, ResourceLimits};
use sysgate_policy::PolicyGate;
use thiserror::Error;

const CATALOG_TIMEOUT_MS: u64 = 10_000;
const FREE_FORM_TIMEOUT_MS: u64 = 15_000;
const SUMMARY_PROBE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SHELL: &str = "/bin/sh";
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Config file is empty: {0}")]
    Empty(String),
    #[error("Invalid YAML: {0}")]
    Invalid(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Timeouts, shell, rlimits and extra deny patterns. Read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub catalog_timeout_ms: u64,
    pub free_form_timeout_ms: u64,
    pub summary_probe_timeout_ms: u64,
    pub shell: String,
    pub max_output_bytes: usize,
    pub limits: ResourceLimits,
    pub extra_deny_patterns: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            catalog_timeout_ms: CATALOG_TIMEOUT_MS,
            free_form_timeout_ms: FREE_FORM_TIMEOUT_MS,
            summary_probe_timeout_ms: SUMMARY_PROBE_TIMEOUT_MS,
            shell: DEFAULT_SHELL.to_string(),
            max_output_bytes: MAX_OUTPUT_BYTES,
            limits: ResourceLimits::default(),
            extra_deny_patterns: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Load and validate a YAML file.
    ///
    /// # Errors
    /// Returns error if the file is missing, empty, not valid YAML, or holds
    /// a value `validate` rejects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Err(ConfigError::Empty(path.display().to_string()));
        }

        let config: GatewayConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when no path is given, otherwise `load`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("catalog_timeout_ms", self.catalog_timeout_ms),
            ("free_form_timeout_ms", self.free_form_timeout_ms),
            ("summary_probe_timeout_ms", self.summary_probe_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{} must be positive", field)));
            }
        }
        if self.shell.trim().is_empty() {
            return Err(ConfigError::InvalidValue("shell must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog_timeout_ms)
    }

    pub fn free_form_timeout(&self) -> Duration {
        Duration::from_millis(self.free_form_timeout_ms)
    }

    pub fn summary_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.summary_probe_timeout_ms)
    }

    pub fn executor(&self) -> Executor {
        Executor::new(self.shell.clone(), self.limits.clone(), self.max_output_bytes)
    }

    pub fn policy(&self) -> PolicyGate {
        PolicyGate::with_extra_denials(self.extra_deny_patterns.iter().cloned())
    }
}
