//! Application configuration
//!
//! Loaded from the JSON file given with `--config`, defaults otherwise.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RustBurnError};

pub const DEFAULT_NAMESPACE: &str = "/apps/rustburn/drives";

fn default_preferences() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rustburn").join("drives.json"))
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Preference store file; in-memory store when unset
    #[serde(default = "default_preferences")]
    pub preferences: Option<PathBuf>,

    /// Prefix of every preference key
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preferences: default_preferences(),
            namespace: default_namespace(),
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&text).map_err(|e| {
            RustBurnError::parameter_validation(format!(
                "Invalid configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Configuration from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() || !self.namespace.starts_with('/') {
            return Err(RustBurnError::parameter_validation(format!(
                "Preference namespace must be an absolute key, got '{}'",
                self.namespace
            )));
        }
        Ok(())
    }
}
