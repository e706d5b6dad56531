//! Application-wide error types.
//!
//! Everything here is a fatal startup error: it aborts the run before any
//! delivery is attempted. Per-delivery failures live in
//! [`crate::notification::DeliveryError`] and never surface as an [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse configuration file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing environment variable: {name}")]
    MissingEnvVar { name: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported channel type '{kind}' for channel '{channel}'")]
    UnsupportedChannel { channel: String, kind: String },

    #[error("Failed to parse events file {}: {source}", path.display())]
    EventsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid events file {}: {reason}", path.display())]
    InvalidEvents { path: PathBuf, reason: String },

    #[error("Failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn missing_env(name: impl Into<String>) -> Self {
        Self::MissingEnvVar { name: name.into() }
    }

    /// Invalid or missing field on a specific channel record.
    pub fn channel(channel: &str, msg: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("channel '{channel}': {msg}"))
    }
}
