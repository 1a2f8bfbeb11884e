//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use crdform_kube::KubeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration did not pass schema validation
    #[error("Validation failed with {errors} error(s)")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation { errors: usize },

    /// A lifecycle operation returned error diagnostics
    #[error("{operation} failed with {errors} error(s)")]
    #[diagnostic(code(crdform::cli::operation))]
    Operation { operation: String, errors: usize },

    /// Unknown resource type or bad arguments
    #[error("{message}")]
    #[diagnostic(code(crdform::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Input could not be parsed
    #[error("Invalid input: {message}")]
    #[diagnostic(code(crdform::cli::input))]
    Input { message: String },

    /// Provider configuration or cluster connection problem
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crdform::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(crdform::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Input { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Operation { .. } => exit_codes::ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Config { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
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

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::UnknownResourceType { name, suggestion } => CliError::Usage {
                message: format!("Unknown resource type '{}'", name),
                help: Some(match suggestion {
                    Some(suggestion) => format!("Did you mean '{}'?", suggestion),
                    None => "Run `crdform resources` to list the available types".to_string(),
                }),
            },
            KubeError::InvalidConfig(message) => CliError::Config {
                message,
                help: Some("Check --kubeconfig, --context and the provider config file".to_string()),
            },
            KubeError::CrdLoad { .. } => CliError::Config {
                message: err.to_string(),
                help: None,
            },
            KubeError::Io(e) => CliError::from(e),
            other => CliError::internal(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
