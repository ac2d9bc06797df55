//! Error types for padrelayd

use padrelay_errors::PadRelayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] PadRelayError),
}
