//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Two writers disagree on the value stored at one values path.
    #[error("Values conflict at '{path}': existing {existing}, incoming {incoming}")]
    ValuesConflict {
        path: String,
        existing: String,
        incoming: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid chart configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    /// True for errors that corrupt the shared values document.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ValuesConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
