//! Resource type definitions derived from CRDs

use kube::discovery::ApiResource;
use tracing::{debug, warn};

use crdform_core::{
    CrdSchema, CrdScope, Metadata, Schema, SchemaFlavor, generate_schema, resource_type_name,
};

use crate::client::ObjectRef;
use crate::error::{KubeError, Result};

/// Everything needed to manage one CRD version as a Terraform resource type
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    /// Terraform type name, e.g. `crdform_cert_manager_io_certificate_v1`
    pub type_name: String,
    /// Name of the CRD this type was generated from
    pub crd_name: String,
    /// Group/version/resource the dynamic client talks to
    pub api_resource: ApiResource,
    pub scope: CrdScope,
    pub deprecation_warning: Option<String>,
    pub resource_schema: Schema,
    pub data_source_schema: Schema,
    pub manifest_schema: Schema,
}

impl ResourceDefinition {
    /// One definition per served version that carries an OpenAPI schema
    pub fn from_crd(crd: &CrdSchema, prefix: &str) -> Vec<Self> {
        let mut definitions = Vec::new();
        for version in &crd.versions {
            if !version.served {
                debug!(crd = %crd.name, version = %version.name, "skipping version that is not served");
                continue;
            }
            if version.schema.is_none() {
                warn!(crd = %crd.name, version = %version.name, "skipping version without an OpenAPI schema");
                continue;
            }

            let resource_schema = generate_schema(crd, version, SchemaFlavor::Resource);
            definitions.push(Self {
                type_name: resource_type_name(prefix, &crd.group, &crd.names.kind, &version.name),
                crd_name: crd.name.clone(),
                api_resource: ApiResource {
                    group: crd.group.clone(),
                    version: version.name.clone(),
                    api_version: crd.api_version(&version.name),
                    kind: crd.names.kind.clone(),
                    plural: crd.names.plural.clone(),
                },
                scope: crd.scope,
                deprecation_warning: resource_schema.deprecation_message.clone(),
                data_source_schema: generate_schema(crd, version, SchemaFlavor::DataSource),
                manifest_schema: generate_schema(crd, version, SchemaFlavor::Manifest),
                resource_schema,
            });
        }
        definitions
    }

    pub fn schema(&self, flavor: SchemaFlavor) -> &Schema {
        match flavor {
            SchemaFlavor::Resource => &self.resource_schema,
            SchemaFlavor::DataSource => &self.data_source_schema,
            SchemaFlavor::Manifest => &self.manifest_schema,
        }
    }

    pub fn namespaced(&self) -> bool {
        self.scope.is_namespaced()
    }

    /// Type name of the manifest data source
    pub fn manifest_type_name(&self) -> String {
        format!("{}_manifest", self.type_name)
    }

    /// Object addressed by a model's metadata
    pub fn target(&self, metadata: &Metadata) -> Result<ObjectRef> {
        let namespace = if self.namespaced() {
            let namespace = metadata
                .namespace
                .clone()
                .filter(|ns| !ns.is_empty())
                .ok_or_else(|| {
                    KubeError::InvalidConfig(format!(
                        "{} is namespaced: metadata.namespace must be set",
                        self.api_resource.kind
                    ))
                })?;
            Some(namespace)
        } else {
            None
        };
        Ok(ObjectRef::new(metadata.name.clone(), namespace))
    }
}
