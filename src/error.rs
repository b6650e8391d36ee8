use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading `configuration.json`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Errors raised while loading the analysis report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to read report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse report {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed finding #{index}: {reason}")]
    MalformedFinding { index: usize, reason: &'static str },
}
