//! CLI commands

pub mod create;
pub mod delete;
pub mod get;
pub mod import;
pub mod manifest;
pub mod read;
pub mod resources;
pub mod schema;
pub mod update;
pub mod validate;

use crdform_kube::{Provider, ProviderConfig};
use tracing::debug;

use crate::GlobalArgs;
use crate::error::Result;

/// Provider configuration with command line overrides applied
pub fn provider_config(global: &GlobalArgs) -> Result<ProviderConfig> {
    let mut config = match &global.config {
        Some(path) => ProviderConfig::load_from(path)?,
        None => ProviderConfig::load()?,
    };

    if let Some(kubeconfig) = &global.kubeconfig {
        config.kubeconfig = Some(kubeconfig.clone());
    }
    if let Some(context) = &global.context {
        config.context = Some(context.clone());
    }
    if let Some(field_manager) = &global.field_manager {
        config.field_manager = field_manager.clone();
    }
    config.crd_paths.extend(global.crd_paths.iter().cloned());
    if global.no_builtin_crds {
        config.builtin_crds = false;
    }

    debug!(?config, "provider configuration");
    Ok(config)
}

/// Provider for commands that never talk to the cluster
pub fn offline_provider(global: &GlobalArgs) -> Result<Provider> {
    Ok(Provider::new(provider_config(global)?)?)
}

/// Provider connected to the configured cluster
///
/// The type name is resolved first so a typo fails before any connection attempt.
pub async fn connected_provider(global: &GlobalArgs, type_name: &str) -> Result<Provider> {
    let mut provider = offline_provider(global)?;
    provider.registry().get(type_name)?;
    provider.connect().await?;
    Ok(provider)
}
