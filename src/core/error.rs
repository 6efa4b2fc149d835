use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectralError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),
    #[error("Backend error: {0}")]
    BackendError(String),
    #[error("Branch error: {0}")]
    BranchError(String),
    #[error("Invalid selector '{0}': expected 'model/explore'")]
    InvalidSelector(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<toml::de::Error> for SpectralError {
    fn from(err: toml::de::Error) -> Self {
        SpectralError::ConfigError(err.to_string())
    }
}
