//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use chartify_convert::ConvertError;
use chartify_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Manifests could not be read or the chart settings are invalid
    #[error("Input error: {message}")]
    #[diagnostic(code(chartify::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The conversion was aborted
    #[error("Conversion failed: {message}")]
    #[diagnostic(code(chartify::cli::conversion))]
    Conversion {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Some claimed objects could not be converted
    #[error("{failed} object(s) could not be converted")]
    #[diagnostic(
        code(chartify::cli::incomplete),
        help("the chart was generated without them; see the errors above")
    )]
    Incomplete { failed: usize },

    /// The chart directory cannot be written
    #[error("Output error: {message}")]
    #[diagnostic(code(chartify::cli::output))]
    Output {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartify::cli::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(chartify::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::Conversion { .. } | CliError::Incomplete { .. } => {
                exit_codes::CONVERSION_ERROR
            }
            CliError::Output { .. } => exit_codes::OUTPUT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an output error with help text
    pub fn output_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an IO error with the path it concerns
    pub fn io_at(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_conflict() {
            return CliError::Conversion {
                message: err.to_string(),
                help: None,
            };
        }
        CliError::Input {
            message: err.to_string(),
            help: None,
        }
    }
}

impl From<ConvertError> for CliError {
    fn from(err: ConvertError) -> Self {
        CliError::Conversion {
            help: err.help().map(|help| help.to_string()),
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
