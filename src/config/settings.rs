use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Default location of the deployment settings, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "configuration.json";

/// Deployment settings stored in configuration.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticConfig {
    /// Image reference of the analysis container
    pub container_name: String,

    /// Base name for containers; each run appends a timestamp
    pub name: String,

    /// Where the source tree is mounted inside the container
    pub docker_working_dir: String,

    /// Where the container writes its results
    pub docker_results_dir: String,
}

impl StaticConfig {
    /// Load settings from disk and check that every field is set
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content.trim())
    }

    /// Reject blank values; they would produce an unusable `docker run`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("container_name", &self.container_name),
            ("name", &self.name),
            ("docker_working_dir", &self.docker_working_dir),
            ("docker_results_dir", &self.docker_results_dir),
        ];

        for (key, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(key));
            }
        }

        Ok(())
    }
}
