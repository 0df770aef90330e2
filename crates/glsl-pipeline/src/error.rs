use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported configuration format '{0}'; expected .toml or .json")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
