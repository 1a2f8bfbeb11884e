//! Error types for crdform-kube

use thiserror::Error;

/// Result type for crdform-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while talking to Kubernetes or resolving resources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("{0}")]
    Api(#[from] kube::Error),

    /// Schema, conversion or model error
    #[error(transparent)]
    Core(#[from] crdform_core::CoreError),

    /// No resource type with this name is registered
    #[error("unknown resource type '{name}'{}", did_you_mean(.suggestion))]
    UnknownResourceType {
        name: String,
        suggestion: Option<String>,
    },

    /// CRD file could not be loaded
    #[error("failed to load CRDs from {path}: {message}")]
    CrdLoad { path: String, message: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Timeout
    #[error("timed out after {0}")]
    Timeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<kube::config::KubeconfigError> for KubeError {
    fn from(e: kube::config::KubeconfigError) -> Self {
        KubeError::InvalidConfig(e.to_string())
    }
}

impl From<kube::config::InferConfigError> for KubeError {
    fn from(e: kube::config::InferConfigError) -> Self {
        KubeError::InvalidConfig(e.to_string())
    }
}

impl KubeError {
    /// An API error as the server would report it
    pub fn api_status(code: u16, reason: &str, message: impl Into<String>) -> Self {
        KubeError::Api(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: message.into(),
            reason: reason.to_string(),
            code,
        }))
    }

    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = KubeError::api_status(404, "NotFound", "certificates \"web\" not found");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_conflict());

        let conflict = KubeError::api_status(409, "Conflict", "Apply failed with 1 conflict");
        assert!(conflict.is_conflict());
        assert!(!KubeError::Timeout("5s".to_string()).is_not_found());
    }

    #[test]
    fn test_unknown_resource_type_display() {
        let err = KubeError::UnknownResourceType {
            name: "crdform_cert_manager_io_certificat_v1".to_string(),
            suggestion: Some("crdform_cert_manager_io_certificate_v1".to_string()),
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"unknown resource type 'crdform_cert_manager_io_certificat_v1' (did you mean 'crdform_cert_manager_io_certificate_v1'?)"
        );

        let err = KubeError::UnknownResourceType {
            name: "nope".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown resource type 'nope'");
    }
}
