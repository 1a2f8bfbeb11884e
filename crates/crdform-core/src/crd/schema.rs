//! Typed view of a CustomResourceDefinition
//!
//! Only what shapes a Terraform schema is kept: names, scope, the versions
//! and their OpenAPI v3 property trees. Everything else in the manifest is
//! ignored on deserialization.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// `<plural>.<group>`
    pub name: String,
    pub group: String,
    pub scope: CrdScope,
    pub names: CrdNames,
    pub versions: Vec<CrdVersionSchema>,
}

impl CrdSchema {
    /// The version objects are persisted in
    pub fn storage_version(&self) -> Option<&CrdVersionSchema> {
        self.versions.iter().find(|v| v.storage)
    }

    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersionSchema> {
        self.versions.iter().filter(|v| v.served)
    }

    /// `apiVersion` of objects in `version`
    pub fn api_version(&self, version: &str) -> String {
        match self.group.as_str() {
            "" => version.to_string(),
            group => format!("{}/{}", group, version),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CrdScope {
    #[default]
    Namespaced,
    Cluster,
}

impl CrdScope {
    pub fn is_namespaced(self) -> bool {
        matches!(self, Self::Namespaced)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Namespaced => "Namespaced",
            Self::Cluster => "Cluster",
        }
    }
}

impl fmt::Display for CrdScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `spec.names` of a CRD
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdNames {
    pub kind: String,
    pub plural: String,
    #[serde(default)]
    pub singular: Option<String>,
    #[serde(default)]
    pub short_names: Vec<String>,
    #[serde(default)]
    pub list_kind: Option<String>,
}

/// One entry of `spec.versions`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdVersionSchema {
    pub name: String,
    #[serde(default = "served_by_default")]
    pub served: bool,
    #[serde(default)]
    pub storage: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub deprecation_warning: Option<String>,
    /// Root of `schema.openAPIV3Schema`
    #[serde(default, deserialize_with = "openapi_root")]
    pub schema: Option<SchemaProperty>,
}

fn served_by_default() -> bool {
    true
}

fn openapi_root<'de, D>(deserializer: D) -> Result<Option<SchemaProperty>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Validation {
        #[serde(rename = "openAPIV3Schema")]
        root: Option<SchemaProperty>,
    }

    Ok(Option::<Validation>::deserialize(deserializer)?.and_then(|v| v.root))
}

impl CrdVersionSchema {
    /// The `spec` property of the root schema
    pub fn spec_schema(&self) -> Option<&SchemaProperty> {
        self.schema.as_ref()?.properties.get("spec")
    }
}

/// An OpenAPI v3 schema node, restricted to structural schemas
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaProperty {
    #[serde(rename = "type", default)]
    pub kind: PropertyKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub items: Option<Box<SchemaProperty>>,
    #[serde(default)]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(rename = "x-kubernetes-preserve-unknown-fields", default)]
    pub preserve_unknown_fields: bool,
    #[serde(rename = "x-kubernetes-embedded-resource", default)]
    pub embedded_resource: bool,
    #[serde(rename = "x-kubernetes-int-or-string", default)]
    pub int_or_string: bool,
}

impl SchemaProperty {
    pub fn of_kind(kind: PropertyKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Whether the node declares its own fields
    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|field| field == name)
    }

    /// Descend through nested properties along a dotted path
    pub fn property(&self, path: &str) -> Option<&SchemaProperty> {
        path.split('.')
            .try_fold(self, |node, part| node.properties.get(part))
    }

    /// Value schema of a map-like object
    pub fn map_values(&self) -> Option<&SchemaProperty> {
        match self.additional_properties.as_ref()? {
            AdditionalProperties::Schema(values) => Some(values),
            AdditionalProperties::Allowed(_) => None,
        }
    }
}

/// The `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    #[default]
    Object,
    #[serde(other)]
    Unknown,
}

/// `additionalProperties`: a boolean or a schema for the values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaProperty>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property(value: serde_json::Value) -> SchemaProperty {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_property_lookup() {
        let spec = property(json!({
            "type": "object",
            "required": ["secretName"],
            "properties": {
                "secretName": {"type": "string"},
                "issuerRef": {"type": "object", "properties": {"name": {"type": "string"}}}
            }
        }));

        assert!(spec.has_properties());
        assert!(spec.is_required("secretName"));
        assert!(!spec.is_required("issuerRef"));
        assert_eq!(spec.property("issuerRef.name").unwrap().kind, PropertyKind::String);
        assert!(spec.property("issuerRef.kind").is_none());
    }

    #[test]
    fn test_kubernetes_extensions() {
        let port = property(json!({"x-kubernetes-int-or-string": true, "anyOf": [{"type": "integer"}, {"type": "string"}]}));
        assert!(port.int_or_string);
        assert_eq!(port.kind, PropertyKind::Object);

        let raw = property(json!({"type": "object", "x-kubernetes-preserve-unknown-fields": true}));
        assert!(raw.preserve_unknown_fields);
        assert!(!raw.embedded_resource);
    }

    #[test]
    fn test_unknown_type_keyword() {
        assert_eq!(property(json!({"type": "null"})).kind, PropertyKind::Unknown);
    }

    #[test]
    fn test_additional_properties() {
        let labels = property(json!({"type": "object", "additionalProperties": {"type": "integer"}}));
        assert_eq!(labels.map_values().unwrap().kind, PropertyKind::Integer);

        let open = property(json!({"type": "object", "additionalProperties": true}));
        assert_eq!(open.additional_properties, Some(AdditionalProperties::Allowed(true)));
        assert!(open.map_values().is_none());
    }

    #[test]
    fn test_version_defaults() {
        let version: CrdVersionSchema = serde_json::from_value(json!({"name": "v1"})).unwrap();
        assert!(version.served);
        assert!(!version.storage);
        assert!(version.schema.is_none());
        assert!(version.spec_schema().is_none());
    }

    #[test]
    fn test_api_version() {
        let crd = CrdSchema {
            name: "widgets.example.com".to_string(),
            group: "example.com".to_string(),
            scope: CrdScope::Cluster,
            names: CrdNames::default(),
            versions: vec![],
        };
        assert_eq!(crd.api_version("v1"), "example.com/v1");
        assert_eq!(crd.scope.to_string(), "Cluster");
        assert!(!crd.scope.is_namespaced());

        let core = CrdSchema {
            group: String::new(),
            ..crd
        };
        assert_eq!(core.api_version("v1"), "v1");
    }
}
