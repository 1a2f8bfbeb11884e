//! Provider: registry, configuration and client wiring

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crdform_core::{CrdScope, Diagnostics};

use crate::client::{KubeResourceClient, ResourceClient};
use crate::config::ProviderConfig;
use crate::data_source::{CrdDataSource, ManifestDataSource};
use crate::error::{KubeError, Result};
use crate::registry::Registry;
use crate::resource::{CrdResource, validate_config};

/// Summary of one resource type, as listed by `resources`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeInfo {
    pub type_name: String,
    pub api_version: String,
    pub kind: String,
    pub scope: CrdScope,
    pub crd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<String>,
}

/// Entry point handing out resources and data sources
pub struct Provider {
    config: ProviderConfig,
    registry: Registry,
    client: Option<Arc<dyn ResourceClient>>,
}

impl Provider {
    /// Build the registry described by `config`
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = if config.builtin_crds {
            Registry::with_builtins(config.type_prefix.clone())?
        } else {
            Registry::new(config.type_prefix.clone())
        };
        for path in &config.crd_paths {
            let count = registry.load_path(path)?;
            info!(path = %path.display(), count, "loaded CRDs");
        }

        Ok(Self {
            config,
            registry,
            client: None,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Connect to the cluster named by the configuration
    pub async fn connect(&mut self) -> Result<()> {
        let client = self.config.client().await?;
        self.configure(Arc::new(KubeResourceClient::new(client)));
        Ok(())
    }

    /// Use an already built client
    pub fn configure(&mut self, client: Arc<dyn ResourceClient>) {
        self.client = Some(client);
    }

    fn client(&self) -> Result<Arc<dyn ResourceClient>> {
        self.client.clone().ok_or_else(|| {
            KubeError::InvalidConfig("provider is not connected to a cluster".to_string())
        })
    }

    pub fn resource(&self, type_name: &str) -> Result<CrdResource> {
        Ok(CrdResource::new(
            self.registry.get(type_name)?,
            self.client()?,
            self.config.resource_defaults(),
        ))
    }

    pub fn data_source(&self, type_name: &str) -> Result<CrdDataSource> {
        Ok(CrdDataSource::new(
            self.registry.get(type_name)?,
            self.client()?,
        ))
    }

    /// Manifest data sources never need a client
    pub fn manifest(&self, type_name: &str) -> Result<ManifestDataSource> {
        Ok(ManifestDataSource::new(
            self.registry.get_manifest(type_name)?,
        ))
    }

    /// Validate a resource configuration offline
    pub fn validate(&self, type_name: &str, config: &serde_json::Value) -> Result<Diagnostics> {
        Ok(validate_config(&*self.registry.get(type_name)?, config))
    }

    pub fn resource_types(&self) -> Vec<ResourceTypeInfo> {
        self.registry
            .definitions()
            .map(|definition| ResourceTypeInfo {
                type_name: definition.type_name.clone(),
                api_version: definition.api_resource.api_version.clone(),
                kind: definition.api_resource.kind.clone(),
                scope: definition.scope,
                crd: definition.crd_name.clone(),
                deprecation: definition.deprecation_warning.clone(),
            })
            .collect()
    }
}
