use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("profile not found: {0}")]
    UnknownProfile(String),
    #[error("no home directory available to hold profiles")]
    NoConfigDir,
    #[error("invalid profile: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse trace: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("event at {at}ms targets unknown carousel '{name}'")]
    UnknownCarousel { name: String, at: u64 },
    #[error("carousel '{0}' declared twice")]
    DuplicateCarousel(String),
    #[error("carousel '{name}': {reason}")]
    Geometry { name: String, reason: String },
    #[error("event at {at}ms needs a target carousel")]
    MissingTarget { at: u64 },
}
