//! Resource model shared by every generated resource type

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::attribute::{AttributeKind, Attributes, Schema};
use crate::convert::{object_to_state, state_to_object};
use crate::error::{CoreError, Result};
use crate::generate::{body_attributes, is_reserved};

/// Object metadata managed through Terraform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub annotations: Option<BTreeMap<String, String>>,
}

/// A `wait_for` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitCondition {
    pub jsonpath: String,
    pub value: String,
}

/// Terraform model of a custom resource
///
/// The bookkeeping fields are typed; everything derived from the CRD's
/// OpenAPI schema lives in `body`, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub field_manager: Option<String>,
    #[serde(default)]
    pub force_conflicts: Option<bool>,
    #[serde(default)]
    pub wait_for: Option<Vec<WaitCondition>>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ResourceModel {
    /// Decode a plan, state or config
    pub fn from_state(state: &Value) -> Result<Self> {
        Ok(serde_json::from_value(state.clone())?)
    }

    /// State for an imported object: only the lookup keys are known
    pub fn imported(name: &str, namespace: Option<&str>) -> Self {
        Self {
            id: Some(format_id(name, namespace)),
            metadata: Some(Metadata {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn metadata(&self) -> Result<&Metadata> {
        self.metadata.as_ref().ok_or_else(|| CoreError::MissingField {
            field: "metadata".to_string(),
        })
    }

    /// Encode as state: exactly the schema's attributes, null when unset
    pub fn to_state(&self, schema: &Schema) -> Result<Value> {
        let mut full = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(CoreError::conversion("<root>", "model is not an object")),
        };
        Ok(Value::Object(conform(&schema.attributes, &mut full)))
    }

    /// Build the Kubernetes object this model describes
    pub fn to_object(&self, schema: &Schema, api_version: &str, kind: &str) -> Result<Value> {
        let metadata = self.metadata()?;

        let mut object = Map::new();
        object.insert("apiVersion".to_string(), Value::String(api_version.to_string()));
        object.insert("kind".to_string(), Value::String(kind.to_string()));

        let mut meta = Map::new();
        meta.insert("name".to_string(), Value::String(metadata.name.clone()));
        if let Some(namespace) = &metadata.namespace {
            meta.insert("namespace".to_string(), Value::String(namespace.clone()));
        }
        if let Some(labels) = &metadata.labels {
            meta.insert("labels".to_string(), serde_json::to_value(labels)?);
        }
        if let Some(annotations) = &metadata.annotations {
            meta.insert("annotations".to_string(), serde_json::to_value(annotations)?);
        }
        object.insert("metadata".to_string(), Value::Object(meta));

        let body: Map<String, Value> = self
            .body
            .iter()
            .filter(|(name, _)| !is_reserved(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        object.extend(state_to_object(&body_attributes(schema), &body)?);

        Ok(Value::Object(object))
    }

    /// Overwrite everything the server owns with a Kubernetes response
    ///
    /// Bookkeeping fields (`id`, `field_manager`, `force_conflicts`,
    /// `wait_for`) are kept.
    pub fn merge_object(&mut self, schema: &Schema, object: &Value) -> Result<()> {
        let map = object
            .as_object()
            .ok_or_else(|| CoreError::conversion("<root>", "Kubernetes object is not a JSON object"))?;

        if let Some(api_version) = map.get("apiVersion").and_then(Value::as_str) {
            self.api_version = Some(api_version.to_string());
        }
        if let Some(kind) = map.get("kind").and_then(Value::as_str) {
            self.kind = Some(kind.to_string());
        }
        let metadata = map.get("metadata").ok_or_else(|| CoreError::MissingField {
            field: "metadata".to_string(),
        })?;
        self.metadata = Some(serde_json::from_value(metadata.clone())?);
        self.body = object_to_state(&body_attributes(schema), map)?;
        Ok(())
    }

    /// Recompute `id` from metadata
    pub fn refresh_id(&mut self) -> Result<()> {
        let metadata = self.metadata()?;
        self.id = Some(format_id(&metadata.name, metadata.namespace.as_deref()));
        Ok(())
    }
}

/// Keep exactly the schema's attributes, recursing into nested objects
fn conform(attributes: &Attributes, values: &mut Map<String, Value>) -> Map<String, Value> {
    let mut state = Map::new();
    for (name, attribute) in attributes {
        let value = match (values.remove(name), &attribute.kind) {
            (Some(Value::Object(mut nested)), AttributeKind::Object { attributes }) => {
                Value::Object(conform(attributes, &mut nested))
            }
            (Some(value), _) => value,
            (None, _) => Value::Null,
        };
        state.insert(name.clone(), value);
    }
    state
}

/// Resource identifier: `name/namespace`, or `name` for cluster-scoped objects
pub fn format_id(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) => format!("{}/{}", name, namespace),
        None => name.to_string(),
    }
}

/// Parse an import identifier into `(namespace, name)`
///
/// Namespaced kinds take `namespace/name`, cluster-scoped kinds take `name`.
pub fn parse_import_id(id: &str, namespaced: bool) -> Result<(Option<String>, String)> {
    let invalid = |expected: &str| CoreError::InvalidImportId {
        id: id.to_string(),
        expected: expected.to_string(),
    };

    if namespaced {
        match id.split_once('/') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok((Some(namespace.to_string()), name.to_string()))
            }
            _ => Err(invalid("namespace/name")),
        }
    } else if id.is_empty() || id.contains('/') {
        Err(invalid("name"))
    } else {
        Ok((None, id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CrdParser;
    use crate::generate::{SchemaFlavor, generate_schema};
    use serde_json::json;

    const WIDGET_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                replicaCount:
                  type: integer
                displayName:
                  type: string
"#;

    fn schema(flavor: SchemaFlavor) -> Schema {
        let crd = CrdParser::parse(WIDGET_CRD).unwrap();
        let version = crd.versions[0].clone();
        generate_schema(&crd, &version, flavor)
    }

    fn plan() -> Value {
        json!({
            "id": null,
            "field_manager": null,
            "force_conflicts": null,
            "wait_for": [{"jsonpath": "status.phase", "value": "Ready"}],
            "api_version": null,
            "kind": null,
            "metadata": {"name": "gizmo", "namespace": "default", "labels": {"app": "gizmo"}, "annotations": null},
            "spec": {"replica_count": 2, "display_name": "Gizmo"}
        })
    }

    #[test]
    fn test_from_state() {
        let model = ResourceModel::from_state(&plan()).unwrap();
        assert_eq!(model.metadata().unwrap().name, "gizmo");
        assert_eq!(model.wait_for.as_ref().unwrap()[0].value, "Ready");
        assert_eq!(model.body.keys().collect::<Vec<_>>(), vec!["spec"]);
    }

    #[test]
    fn test_to_object() {
        let model = ResourceModel::from_state(&plan()).unwrap();
        let object = model
            .to_object(&schema(SchemaFlavor::Resource), "example.com/v1", "Widget")
            .unwrap();
        assert_eq!(
            object,
            json!({
                "apiVersion": "example.com/v1",
                "kind": "Widget",
                "metadata": {"name": "gizmo", "namespace": "default", "labels": {"app": "gizmo"}},
                "spec": {"replicaCount": 2, "displayName": "Gizmo"}
            })
        );
    }

    #[test]
    fn test_to_object_requires_metadata() {
        let model = ResourceModel::default();
        let err = model
            .to_object(&schema(SchemaFlavor::Resource), "example.com/v1", "Widget")
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: metadata");
    }

    #[test]
    fn test_merge_object_overwrites_server_fields() {
        let schema = schema(SchemaFlavor::Resource);
        let mut model = ResourceModel::from_state(&plan()).unwrap();
        model.field_manager = Some("ci".to_string());

        let response = json!({
            "apiVersion": "example.com/v1",
            "kind": "Widget",
            "metadata": {"name": "gizmo", "namespace": "default", "uid": "1234", "resourceVersion": "7"},
            "spec": {"replicaCount": 5},
            "status": {"phase": "Ready"}
        });
        model.merge_object(&schema, &response).unwrap();
        model.refresh_id().unwrap();

        let state = model.to_state(&schema).unwrap();
        assert_eq!(state["id"], "gizmo/default");
        assert_eq!(state["field_manager"], "ci");
        assert_eq!(state["api_version"], "example.com/v1");
        assert_eq!(state["metadata"]["labels"], Value::Null);
        assert_eq!(state["spec"], json!({"replica_count": 5, "display_name": null}));
        assert!(state.get("status").is_none());
    }

    #[test]
    fn test_to_state_matches_flavor() {
        let model = ResourceModel::from_state(&plan()).unwrap();
        let state = model.to_state(&schema(SchemaFlavor::Manifest)).unwrap();
        let keys: Vec<&String> = state.as_object().unwrap().keys().collect();
        assert!(!keys.iter().any(|k| *k == "id" || *k == "wait_for"));
        assert_eq!(state["yaml"], Value::Null);
    }

    #[test]
    fn test_imported() {
        let model = ResourceModel::imported("gizmo", Some("default"));
        let state = model.to_state(&schema(SchemaFlavor::Resource)).unwrap();
        assert_eq!(state["id"], "gizmo/default");
        assert_eq!(state["metadata"]["namespace"], "default");
        assert_eq!(state["spec"], Value::Null);
    }

    #[test]
    fn test_format_id() {
        assert_eq!(format_id("web", Some("prod")), "web/prod");
        assert_eq!(format_id("letsencrypt", None), "letsencrypt");
    }

    #[test]
    fn test_parse_import_id() {
        assert_eq!(
            parse_import_id("prod/web", true).unwrap(),
            (Some("prod".to_string()), "web".to_string())
        );
        assert_eq!(
            parse_import_id("letsencrypt", false).unwrap(),
            (None, "letsencrypt".to_string())
        );

        for bad in ["web", "/web", "prod/", "a/b/c"] {
            assert!(parse_import_id(bad, true).is_err(), "{}", bad);
        }
        assert!(parse_import_id("prod/web", false).is_err());

        let err = parse_import_id("web", true).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"Expected import identifier with format: 'namespace/name'. Got: 'web'"
        );
    }
}
