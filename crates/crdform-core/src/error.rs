//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid CRD: {message}")]
    InvalidCrd { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("{path}: {message}")]
    Conversion { path: String, message: String },

    #[error("Invalid JSONPath '{expression}': {message}")]
    JsonPath { expression: String, message: String },

    #[error("Expected import identifier with format: '{expected}'. Got: '{id}'")]
    InvalidImportId { id: String, expected: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl CoreError {
    pub(crate) fn invalid_crd(message: impl Into<String>) -> Self {
        Self::InvalidCrd {
            message: message.into(),
        }
    }

    pub(crate) fn conversion(path: impl ToString, message: impl Into<String>) -> Self {
        Self::Conversion {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
