//! Read-only surfaces: the data source and the manifest renderer

use serde_json::Value;
use std::sync::Arc;

use crdform_core::{ResourceModel, Schema};

use crate::client::ResourceClient;
use crate::definition::ResourceDefinition;
use crate::resource::{API_ERROR, DECODE_PLAN, MARSHAL, ResourceResponse, UNMARSHAL};

/// Looks up an existing object by name and namespace
pub struct CrdDataSource {
    definition: Arc<ResourceDefinition>,
    client: Arc<dyn ResourceClient>,
}

impl CrdDataSource {
    pub fn new(definition: Arc<ResourceDefinition>, client: Arc<dyn ResourceClient>) -> Self {
        Self { definition, client }
    }

    pub fn schema(&self) -> &Schema {
        &self.definition.data_source_schema
    }

    pub async fn read(&self, config: &Value) -> ResourceResponse {
        let mut model = match ResourceModel::from_state(config) {
            Ok(model) => model,
            Err(e) => return ResourceResponse::error(DECODE_PLAN, e),
        };
        let target = match model
            .metadata()
            .map_err(Into::into)
            .and_then(|metadata| self.definition.target(metadata))
        {
            Ok(target) => target,
            Err(e) => return ResourceResponse::error(DECODE_PLAN, e),
        };

        let object = match self.client.get(&self.definition.api_resource, &target).await {
            Ok(object) => object,
            Err(e) => return ResourceResponse::error(API_ERROR, e),
        };

        let state = model
            .merge_object(self.schema(), &object)
            .and_then(|()| model.refresh_id())
            .and_then(|()| model.to_state(self.schema()));
        match state {
            Ok(state) => ResourceResponse::ok(state),
            Err(e) => ResourceResponse::error(UNMARSHAL, e),
        }
    }
}

/// Renders a configuration as a Kubernetes manifest without contacting the cluster
pub struct ManifestDataSource {
    definition: Arc<ResourceDefinition>,
}

impl ManifestDataSource {
    pub fn new(definition: Arc<ResourceDefinition>) -> Self {
        Self { definition }
    }

    pub fn schema(&self) -> &Schema {
        &self.definition.manifest_schema
    }

    pub fn read(&self, config: &Value) -> ResourceResponse {
        let mut model = match ResourceModel::from_state(config) {
            Ok(model) => model,
            Err(e) => return ResourceResponse::error(DECODE_PLAN, e),
        };

        let api_resource = &self.definition.api_resource;
        let rendered = model
            .to_object(self.schema(), &api_resource.api_version, &api_resource.kind)
            .map_err(|e| e.to_string())
            .and_then(|object| serde_yaml::to_string(&object).map_err(|e| e.to_string()));
        let yaml = match rendered {
            Ok(yaml) => yaml,
            Err(e) => return ResourceResponse::error(MARSHAL, e),
        };

        model.api_version = Some(api_resource.api_version.clone());
        model.kind = Some(api_resource.kind.clone());
        let mut state = match model.to_state(self.schema()) {
            Ok(state) => state,
            Err(e) => return ResourceResponse::error(MARSHAL, e),
        };
        state["yaml"] = Value::String(yaml);
        ResourceResponse::ok(state)
    }
}
