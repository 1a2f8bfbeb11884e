//! Provider configuration
//!
//! Stored in `~/.config/crdform/config.yaml`; every field is optional.

use kube::Client;
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{KubeError, Result};
use crate::resource::ResourceDefaults;
use crate::wait::WaitSettings;

/// Provider configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Prefix of every resource type name
    #[serde(default = "default_type_prefix")]
    pub type_prefix: String,

    /// Kubeconfig file; falls back to the usual discovery when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Default field manager for Server-Side Apply
    #[serde(default = "default_field_manager")]
    pub field_manager: String,

    /// Default for `force_conflicts`
    #[serde(default)]
    pub force_conflicts: bool,

    /// Polling used by `wait_for`
    #[serde(default)]
    pub wait: WaitSettings,

    /// Extra CRD files or directories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crd_paths: Vec<PathBuf>,

    /// Register the embedded CRD catalog
    #[serde(default = "default_true")]
    pub builtin_crds: bool,
}

fn default_type_prefix() -> String {
    "crdform".to_string()
}

fn default_field_manager() -> String {
    "crdform".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            type_prefix: default_type_prefix(),
            kubeconfig: None,
            context: None,
            field_manager: default_field_manager(),
            force_conflicts: false,
            wait: WaitSettings::default(),
            crd_paths: Vec::new(),
            builtin_crds: true,
        }
    }
}

impl ProviderConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            KubeError::InvalidConfig("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("crdform").join("config.yaml"))
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let prefix_ok = self
            .type_prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
            && self
                .type_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !prefix_ok {
            return Err(KubeError::InvalidConfig(format!(
                "typePrefix '{}' must start with a lowercase letter and contain only lowercase letters, digits and underscores",
                self.type_prefix
            )));
        }
        if self.field_manager.trim().is_empty() {
            return Err(KubeError::InvalidConfig(
                "fieldManager must not be empty".to_string(),
            ));
        }
        if self.wait.poll_interval.is_zero() {
            return Err(KubeError::InvalidConfig(
                "wait.pollInterval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults handed to every resource
    pub fn resource_defaults(&self) -> ResourceDefaults {
        ResourceDefaults {
            field_manager: self.field_manager.clone(),
            force_conflicts: self.force_conflicts,
            wait: self.wait.clone(),
        }
    }

    /// Build a Kubernetes client from the kubeconfig settings
    pub async fn client(&self) -> Result<Client> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };

        let config = match &self.kubeconfig {
            Some(path) => {
                debug!(path = %path.display(), context = ?self.context, "loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
            None if self.context.is_some() => Config::from_kubeconfig(&options).await?,
            None => Config::infer().await?,
        };

        Ok(Client::try_from(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: ProviderConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.type_prefix, "crdform");
        assert_eq!(config.field_manager, "crdform");
        assert!(config.builtin_crds);
        assert_eq!(config.wait.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
typePrefix: k8s
context: kind-dev
fieldManager: platform-team
forceConflicts: true
wait:
  timeout: 90s
  pollInterval: 1s
crdPaths:
  - ./crds
builtinCrds: false
"#,
        )
        .unwrap();

        let config = ProviderConfig::load_from(&path).unwrap();
        assert_eq!(config.type_prefix, "k8s");
        assert_eq!(config.context.as_deref(), Some("kind-dev"));
        assert!(config.force_conflicts);
        assert_eq!(config.wait.timeout, Duration::from_secs(90));
        assert_eq!(config.crd_paths, vec![PathBuf::from("./crds")]);
        assert!(!config.builtin_crds);

        let defaults = config.resource_defaults();
        assert_eq!(defaults.field_manager, "platform-team");
        assert!(defaults.force_conflicts);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.yaml");
        let config = ProviderConfig {
            field_manager: "ops".to_string(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(ProviderConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_validate() {
        let bad_prefix = ProviderConfig {
            type_prefix: "Crd-Form".to_string(),
            ..Default::default()
        };
        assert!(bad_prefix.validate().is_err());

        let empty_manager = ProviderConfig {
            field_manager: " ".to_string(),
            ..Default::default()
        };
        assert!(empty_manager.validate().is_err());

        assert!(ProviderConfig::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_client_from_missing_kubeconfig() {
        let config = ProviderConfig {
            kubeconfig: Some(PathBuf::from("/nonexistent/kubeconfig")),
            ..Default::default()
        };
        let err = config.client().await.err().unwrap();
        assert!(matches!(err, KubeError::InvalidConfig(_)));
    }
}
