//! Lifecycle of a CRD-backed resource
//!
//! Create and Update are the same Server-Side Apply; Read is a GET whose
//! response overwrites the local state; Delete is a single DELETE. Errors
//! are never retried: each one becomes a single error diagnostic carrying
//! the underlying error text.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crdform_core::{
    AttributePath, Diagnostic, Diagnostics, JsonPath, ResourceModel, Schema, parse_import_id,
};

use crate::client::{ApplyParams, ObjectRef, ResourceClient};
use crate::definition::ResourceDefinition;
use crate::wait::{ConditionWaiter, WaitSettings};

pub const DECODE_PLAN: &str = "Unable to decode plan";
pub const DECODE_STATE: &str = "Unable to decode state";
pub const MARSHAL: &str = "Unable to marshal resource";
pub const API_ERROR: &str = "Error from Kubernetes API";
pub const UNMARSHAL: &str = "Unable to unmarshal resource";
pub const WAIT_FAILED: &str = "Wait condition not met";
pub const PARSE_ID: &str = "Error parsing ID";
pub const REPLACE_REQUIRED: &str = "Resource replacement required";

/// Provider-level defaults applied when the model leaves a field unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefaults {
    pub field_manager: String,
    pub force_conflicts: bool,
    pub wait: WaitSettings,
}

impl Default for ResourceDefaults {
    fn default() -> Self {
        Self {
            field_manager: "crdform".to_string(),
            force_conflicts: false,
            wait: WaitSettings::default(),
        }
    }
}

/// Outcome of a lifecycle operation
///
/// `state` is `None` when the resource no longer exists (after Delete) or
/// when the operation failed before anything was created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceResponse {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl ResourceResponse {
    pub fn ok(state: Value) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn removed() -> Self {
        Self::default()
    }

    pub fn error(summary: &str, detail: impl ToString) -> Self {
        Self {
            state: None,
            diagnostics: Diagnostic::error(summary, detail.to_string()).into(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }
}

/// Validate a resource configuration without contacting the cluster
pub fn validate_config(definition: &ResourceDefinition, config: &Value) -> Diagnostics {
    let mut diagnostics = definition.resource_schema.validate(config);

    if let Some(conditions) = config.get("wait_for").and_then(Value::as_array) {
        for (i, condition) in conditions.iter().enumerate() {
            let Some(expression) = condition.get("jsonpath").and_then(Value::as_str) else {
                continue;
            };
            if let Err(e) = JsonPath::parse(expression) {
                diagnostics.push(
                    Diagnostic::error("Invalid JSONPath", e.to_string()).at(
                        AttributePath::root()
                            .attribute("wait_for")
                            .index(i)
                            .attribute("jsonpath"),
                    ),
                );
            }
        }
    }

    if let Some(warning) = &definition.deprecation_warning {
        diagnostics.add_warning("Deprecated API version", warning.clone());
    }
    diagnostics
}

/// A managed resource type backed by a CRD
pub struct CrdResource {
    definition: Arc<ResourceDefinition>,
    client: Arc<dyn ResourceClient>,
    defaults: ResourceDefaults,
}

impl CrdResource {
    pub fn new(
        definition: Arc<ResourceDefinition>,
        client: Arc<dyn ResourceClient>,
        defaults: ResourceDefaults,
    ) -> Self {
        Self {
            definition,
            client,
            defaults,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.definition.type_name
    }

    pub fn schema(&self) -> &Schema {
        &self.definition.resource_schema
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    /// Schema-level validation of a configuration
    pub fn validate_config(&self, config: &Value) -> Diagnostics {
        validate_config(&self.definition, config)
    }

    /// Create the object with Server-Side Apply
    pub async fn create(&self, plan: &Value) -> ResourceResponse {
        match ResourceModel::from_state(plan) {
            Ok(model) => self.apply(model).await,
            Err(e) => ResourceResponse::error(DECODE_PLAN, e),
        }
    }

    /// Refresh the state from the cluster
    pub async fn read(&self, state: &Value) -> ResourceResponse {
        let mut model = match ResourceModel::from_state(state) {
            Ok(model) => model,
            Err(e) => return ResourceResponse::error(DECODE_STATE, e),
        };
        let target = match self.target(&model) {
            Ok(target) => target,
            Err(response) => return response,
        };

        let object = match self.client.get(&self.definition.api_resource, &target).await {
            Ok(object) => object,
            Err(e) => return ResourceResponse::error(API_ERROR, e),
        };

        match self.finish(&mut model, &object) {
            Ok(state) => ResourceResponse::ok(state),
            Err(response) => response,
        }
    }

    /// Apply a changed plan; name and namespace cannot change in place
    pub async fn update(&self, plan: &Value, prior_state: &Value) -> ResourceResponse {
        let model = match ResourceModel::from_state(plan) {
            Ok(model) => model,
            Err(e) => return ResourceResponse::error(DECODE_PLAN, e),
        };
        let prior = match ResourceModel::from_state(prior_state) {
            Ok(prior) => prior,
            Err(e) => return ResourceResponse::error(DECODE_STATE, e),
        };

        if let (Some(new), Some(old)) = (&model.metadata, &prior.metadata) {
            if new.name != old.name {
                return ResourceResponse::error(
                    REPLACE_REQUIRED,
                    format!(
                        "metadata.name changed from '{}' to '{}'; the object must be replaced",
                        old.name, new.name
                    ),
                );
            }
            if new.namespace != old.namespace {
                return ResourceResponse::error(
                    REPLACE_REQUIRED,
                    format!(
                        "metadata.namespace changed from '{}' to '{}'; the object must be replaced",
                        old.namespace.as_deref().unwrap_or_default(),
                        new.namespace.as_deref().unwrap_or_default()
                    ),
                );
            }
        }

        self.apply(model).await
    }

    /// Delete the object; an object that is already gone counts as deleted
    pub async fn delete(&self, state: &Value) -> ResourceResponse {
        let model = match ResourceModel::from_state(state) {
            Ok(model) => model,
            Err(e) => return ResourceResponse::error(DECODE_STATE, e),
        };
        let target = match self.target(&model) {
            Ok(target) => target,
            Err(response) => return response,
        };

        match self
            .client
            .delete(&self.definition.api_resource, &target)
            .await
        {
            Ok(()) => ResourceResponse::removed(),
            Err(e) if e.is_not_found() => {
                debug!(object = %target, "object already deleted");
                ResourceResponse::removed()
            }
            Err(e) => ResourceResponse::error(API_ERROR, e),
        }
    }

    /// Turn an import identifier into a state holding only the lookup keys
    ///
    /// Read is expected to follow and fill in the rest.
    pub fn import_state(&self, id: &str) -> ResourceResponse {
        let (namespace, name) = match parse_import_id(id, self.definition.namespaced()) {
            Ok(parsed) => parsed,
            Err(e) => return ResourceResponse::error(PARSE_ID, e),
        };

        let model = ResourceModel::imported(&name, namespace.as_deref());
        match model.to_state(self.schema()) {
            Ok(state) => ResourceResponse::ok(state),
            Err(e) => ResourceResponse::error(MARSHAL, e),
        }
    }

    async fn apply(&self, mut model: ResourceModel) -> ResourceResponse {
        let api_resource = &self.definition.api_resource;
        let object = match model.to_object(self.schema(), &api_resource.api_version, &api_resource.kind) {
            Ok(object) => object,
            Err(e) => return ResourceResponse::error(MARSHAL, e),
        };
        let target = match self.target(&model) {
            Ok(target) => target,
            Err(response) => return response,
        };

        let params = ApplyParams {
            field_manager: model
                .field_manager
                .clone()
                .filter(|fm| !fm.is_empty())
                .unwrap_or_else(|| self.defaults.field_manager.clone()),
            force: model
                .force_conflicts
                .unwrap_or(self.defaults.force_conflicts),
        };

        let applied = match self
            .client
            .apply(api_resource, &target, &object, &params)
            .await
        {
            Ok(applied) => applied,
            Err(e) => return ResourceResponse::error(API_ERROR, e),
        };
        info!(kind = %api_resource.kind, object = %target, "applied");

        model.field_manager = Some(params.field_manager);
        model.force_conflicts = Some(params.force);

        let conditions = model.wait_for.clone().unwrap_or_default();
        if conditions.is_empty() {
            return match self.finish(&mut model, &applied) {
                Ok(state) => ResourceResponse::ok(state),
                Err(response) => response,
            };
        }

        let waiter = ConditionWaiter::new(self.client.clone(), self.defaults.wait.clone());
        match waiter.wait(api_resource, &target, &conditions).await {
            Ok(current) => match self.finish(&mut model, &current) {
                Ok(state) => ResourceResponse::ok(state),
                Err(response) => response,
            },
            Err(e) => {
                // The object exists even though it never became ready
                let state = self.finish(&mut model, &applied).ok();
                ResourceResponse {
                    state,
                    diagnostics: Diagnostic::error(WAIT_FAILED, e.to_string()).into(),
                }
            }
        }
    }

    fn target(&self, model: &ResourceModel) -> Result<ObjectRef, ResourceResponse> {
        let metadata = model
            .metadata()
            .map_err(|e| ResourceResponse::error(DECODE_PLAN, e))?;
        self.definition
            .target(metadata)
            .map_err(|e| ResourceResponse::error(DECODE_PLAN, e))
    }

    /// Merge a server object into the model and encode the new state
    fn finish(&self, model: &mut ResourceModel, object: &Value) -> Result<Value, ResourceResponse> {
        model
            .merge_object(self.schema(), object)
            .and_then(|()| model.refresh_id())
            .and_then(|()| model.to_state(self.schema()))
            .map_err(|e| ResourceResponse::error(UNMARSHAL, e))
    }
}
