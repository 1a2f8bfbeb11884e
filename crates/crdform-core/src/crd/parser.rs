//! CRD manifest parsing
//!
//! Manifests are read into a `serde_json::Value` first so that bundles with
//! other kinds can be filtered before the typed deserialization runs.

use serde::Deserialize;
use serde_json::Value;

use super::schema::{CrdNames, CrdSchema, CrdScope, CrdVersionSchema};
use crate::error::{CoreError, Result};

const CRD_KIND: &str = "CustomResourceDefinition";

#[derive(Deserialize)]
struct Manifest {
    metadata: ManifestMetadata,
    spec: ManifestSpec,
}

#[derive(Deserialize)]
struct ManifestMetadata {
    name: String,
}

#[derive(Deserialize)]
struct ManifestSpec {
    group: String,
    names: CrdNames,
    #[serde(default)]
    scope: CrdScope,
    versions: Vec<CrdVersionSchema>,
}

/// Parser for CRD manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse exactly one CRD from YAML or JSON
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::parse_value(&value)
    }

    /// Every CRD in a multi-document stream; other kinds are skipped
    pub fn parse_documents(yaml: &str) -> Result<Vec<CrdSchema>> {
        let mut crds = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = Value::deserialize(document)?;
            match value.get("kind").and_then(Value::as_str) {
                Some(CRD_KIND) => crds.push(Self::parse_value(&value)?),
                None if value.is_null() => {}
                kind => tracing::debug!(kind = kind.unwrap_or("<none>"), "skipping non-CRD document"),
            }
        }
        Ok(crds)
    }

    pub fn is_crd(value: &Value) -> bool {
        value.get("kind").and_then(Value::as_str) == Some(CRD_KIND)
    }

    /// Parse an already decoded manifest
    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        match value.get("kind").and_then(Value::as_str) {
            Some(CRD_KIND) => {}
            Some(other) => {
                return Err(CoreError::invalid_crd(format!(
                    "expected {}, got {}",
                    CRD_KIND, other
                )));
            }
            None => return Err(CoreError::invalid_crd("manifest has no kind")),
        }

        let manifest = Manifest::deserialize(value).map_err(|e| CoreError::invalid_crd(e.to_string()))?;
        let crd = CrdSchema {
            name: manifest.metadata.name,
            group: manifest.spec.group,
            scope: manifest.spec.scope,
            names: manifest.spec.names,
            versions: manifest.spec.versions,
        };

        if crd.versions.is_empty() {
            return Err(CoreError::invalid_crd(format!("{} declares no versions", crd.name)));
        }
        Ok(crd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{AdditionalProperties, PropertyKind};

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
    singular: widget
    shortNames: [wd]
    listKind: WidgetList
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          description: Widget is a test resource
          type: object
          required: [spec]
          properties:
            apiVersion:
              type: string
            kind:
              type: string
            metadata:
              type: object
            spec:
              type: object
              required: [size]
              properties:
                size:
                  type: integer
                  description: Number of parts
                port:
                  x-kubernetes-int-or-string: true
                tags:
                  type: array
                  items:
                    type: string
                selector:
                  type: object
                  additionalProperties:
                    type: string
                raw:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
            status:
              type: object
    - name: v1beta1
      served: true
      storage: false
      deprecated: true
      deprecationWarning: example.com/v1beta1 Widget is deprecated
      schema:
        openAPIV3Schema:
          type: object
"#;

    #[test]
    fn test_parse_names_and_scope() {
        let crd = CrdParser::parse(WIDGET_CRD).unwrap();

        assert_eq!(crd.name, "widgets.example.com");
        assert_eq!(crd.group, "example.com");
        assert_eq!(crd.scope, CrdScope::Namespaced);
        assert_eq!(crd.names.kind, "Widget");
        assert_eq!(crd.names.plural, "widgets");
        assert_eq!(crd.names.short_names, vec!["wd".to_string()]);
        assert_eq!(crd.names.list_kind.as_deref(), Some("WidgetList"));
    }

    #[test]
    fn test_parse_versions() {
        let crd = CrdParser::parse(WIDGET_CRD).unwrap();

        assert_eq!(crd.versions.len(), 2);
        assert_eq!(crd.storage_version().unwrap().name, "v1");
        assert_eq!(crd.served_versions().count(), 2);

        let beta = &crd.versions[1];
        assert!(beta.deprecated);
        assert_eq!(
            beta.deprecation_warning.as_deref(),
            Some("example.com/v1beta1 Widget is deprecated")
        );
    }

    #[test]
    fn test_parse_property_tree() {
        let crd = CrdParser::parse(WIDGET_CRD).unwrap();
        let root = crd.versions[0].schema.as_ref().unwrap();
        assert!(root.is_required("spec"));
        assert!(root.properties.contains_key("status"));
        assert_eq!(root.description.as_deref(), Some("Widget is a test resource"));

        let spec = crd.versions[0].spec_schema().unwrap();
        assert!(spec.is_required("size"));
        assert_eq!(spec.property("size").unwrap().kind, PropertyKind::Integer);
        assert!(spec.property("port").unwrap().int_or_string);
        assert!(spec.property("raw").unwrap().preserve_unknown_fields);
        assert_eq!(
            spec.property("tags").unwrap().items.as_ref().unwrap().kind,
            PropertyKind::String
        );
        assert!(matches!(
            spec.property("selector").unwrap().additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));
    }

    #[test]
    fn test_parse_rejects_other_kinds() {
        let err = CrdParser::parse("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: test\n")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid CRD: expected CustomResourceDefinition, got ConfigMap"
        );
    }

    #[test]
    fn test_parse_missing_names() {
        let yaml = r#"
kind: CustomResourceDefinition
metadata:
  name: broken.example.com
spec:
  group: example.com
  versions: []
"#;
        let err = CrdParser::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("missing field `names`"), "{}", err);
    }

    #[test]
    fn test_parse_missing_required_fields() {
        let cases = [
            (
                "kind: CustomResourceDefinition\nmetadata:\n  name: x.example.com\n",
                "missing field `spec`",
            ),
            (
                "kind: CustomResourceDefinition\nmetadata: {}\nspec:\n  group: example.com\n  names: {kind: X, plural: xs}\n  versions: [{name: v1}]\n",
                "missing field `name`",
            ),
            (
                "kind: CustomResourceDefinition\nmetadata:\n  name: x.example.com\nspec:\n  names: {kind: X, plural: xs}\n  versions: [{name: v1}]\n",
                "missing field `group`",
            ),
        ];

        for (yaml, expected) in cases {
            let err = CrdParser::parse(yaml).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid CRD: {}", expected));
        }
    }

    #[test]
    fn test_parse_without_versions() {
        let yaml = r#"
kind: CustomResourceDefinition
metadata:
  name: empty.example.com
spec:
  group: example.com
  names: {kind: Empty, plural: empties}
  versions: []
"#;
        let err = CrdParser::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("declares no versions"));
    }

    #[test]
    fn test_parse_cluster_scope_without_schema() {
        let yaml = r#"
kind: CustomResourceDefinition
metadata:
  name: clusterwidgets.example.com
spec:
  group: example.com
  names:
    kind: ClusterWidget
    plural: clusterwidgets
  scope: Cluster
  versions:
    - name: v1
      storage: true
"#;
        let crd = CrdParser::parse(yaml).unwrap();
        assert_eq!(crd.scope, CrdScope::Cluster);
        assert!(crd.versions[0].served);
        assert!(crd.versions[0].schema.is_none());
    }

    #[test]
    fn test_parse_documents_skips_other_kinds() {
        let bundle = format!(
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: widgets\n---\n{}\n",
            WIDGET_CRD.trim()
        );

        let crds = CrdParser::parse_documents(&bundle).unwrap();
        assert_eq!(crds.len(), 1);
        assert_eq!(crds[0].names.kind, "Widget");
        assert!(CrdParser::is_crd(&serde_json::json!({"kind": "CustomResourceDefinition"})));
    }
}
