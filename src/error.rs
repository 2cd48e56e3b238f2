//! Error types shared by the picker components.
//!
//! Validation errors never reach the network, transport errors come from the
//! backend, and protocol errors are unwrapped from server replies.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to get any reply at all from a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be built; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresetError {
    #[error("Please enter a preset name")]
    EmptyName,

    #[error("No files selected")]
    EmptySelection,

    #[error("No valid file paths in selection")]
    NoValidPaths,

    #[error("A save is already in progress")]
    SaveInFlight,

    #[error("Invalid preset")]
    InvalidPreset,

    /// Message unwrapped from a server reply.
    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Transport(String),
}

impl PresetError {
    /// Validation errors are caught before any request is built.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PresetError::EmptyName | PresetError::EmptySelection | PresetError::NoValidPaths
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
