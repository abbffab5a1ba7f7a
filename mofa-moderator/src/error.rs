//! Error types for the moderator crate
//!
//! The engine itself is infallible. These errors cover the ambient layers:
//! loading configuration and talking to the advisory endpoint.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Advisory text provider errors
///
/// None of these ever reach the engine; the advisor turns them into its
/// fallback string.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited by upstream")]
    RateLimited,

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Upstream returned no advice")]
    EmptyResponse,

    #[error("Advisory text generation is disabled")]
    Disabled,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for advisory operations
pub type AdvisoryResult<T> = Result<T, AdvisoryError>;
