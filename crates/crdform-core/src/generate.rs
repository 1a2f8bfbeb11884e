//! Terraform schema generation from CRD versions
//!
//! One CRD version yields three schema flavors: the managed resource, a
//! read-only data source and an offline manifest renderer.

use std::fmt;
use std::str::FromStr;

use crate::attribute::{Attribute, AttributeKind, Attributes, Schema, Validator};
use crate::crd::{CrdSchema, CrdVersionSchema, PropertyKind, SchemaProperty};
use crate::naming::{terraform_name, unique_name};

pub const ID: &str = "id";
pub const FIELD_MANAGER: &str = "field_manager";
pub const FORCE_CONFLICTS: &str = "force_conflicts";
pub const WAIT_FOR: &str = "wait_for";
pub const API_VERSION: &str = "api_version";
pub const KIND: &str = "kind";
pub const METADATA: &str = "metadata";
pub const YAML: &str = "yaml";

/// Root attribute names owned by crdform rather than the CRD
pub const RESERVED_ATTRIBUTES: &[&str] = &[
    ID,
    FIELD_MANAGER,
    FORCE_CONFLICTS,
    WAIT_FOR,
    API_VERSION,
    KIND,
    METADATA,
    YAML,
];

/// Root OpenAPI properties that never become body attributes
const SKIPPED_PROPERTIES: &[&str] = &["apiVersion", "kind", "metadata", "status"];

/// Which Terraform surface a schema is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemaFlavor {
    #[default]
    Resource,
    DataSource,
    Manifest,
}

impl SchemaFlavor {
    pub const ALL: [SchemaFlavor; 3] = [Self::Resource, Self::DataSource, Self::Manifest];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::DataSource => "data-source",
            Self::Manifest => "manifest",
        }
    }
}

impl fmt::Display for SchemaFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource" => Ok(Self::Resource),
            "data-source" | "data_source" => Ok(Self::DataSource),
            "manifest" => Ok(Self::Manifest),
            other => Err(format!("unknown schema flavor '{}'", other)),
        }
    }
}

/// Whether a root attribute name belongs to crdform
pub fn is_reserved(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}

/// The CRD-derived root attributes of a schema
pub fn body_attributes(schema: &Schema) -> Attributes {
    schema
        .attributes
        .iter()
        .filter(|(name, _)| !is_reserved(name))
        .map(|(name, attribute)| (name.clone(), attribute.clone()))
        .collect()
}

/// Generate the schema of one flavor for a CRD version
pub fn generate_schema(
    crd: &CrdSchema,
    version: &CrdVersionSchema,
    flavor: SchemaFlavor,
) -> Schema {
    let api_version = crd.api_version(&version.name);
    let namespaced = crd.scope.is_namespaced();
    let mut attributes = Attributes::new();

    match flavor {
        SchemaFlavor::Resource => {
            attributes.insert(
                ID.to_string(),
                Attribute::computed(AttributeKind::String).description(if namespaced {
                    "Identifier of the object, formatted as name/namespace."
                } else {
                    "Identifier of the object, equal to its name."
                }),
            );
            attributes.insert(
                FIELD_MANAGER.to_string(),
                Attribute::optional_computed(AttributeKind::String).description(
                    "Field manager name used for Server-Side Apply. Defaults to the provider setting.",
                ),
            );
            attributes.insert(
                FORCE_CONFLICTS.to_string(),
                Attribute::optional_computed(AttributeKind::Bool).description(
                    "Take ownership of fields managed by other field managers.",
                ),
            );
            attributes.insert(WAIT_FOR.to_string(), wait_for_attribute());
        }
        SchemaFlavor::DataSource => {
            attributes.insert(
                ID.to_string(),
                Attribute::computed(AttributeKind::String),
            );
        }
        SchemaFlavor::Manifest => {}
    }

    attributes.insert(
        API_VERSION.to_string(),
        Attribute::computed(AttributeKind::String)
            .json("apiVersion")
            .description(format!("Always '{}'.", api_version)),
    );
    attributes.insert(
        KIND.to_string(),
        Attribute::computed(AttributeKind::String)
            .json("kind")
            .description(format!("Always '{}'.", crd.names.kind)),
    );
    attributes.insert(
        METADATA.to_string(),
        metadata_attribute(namespaced, flavor),
    );

    let root = version.schema.clone().unwrap_or_default();
    for (name, attribute) in root_attributes(&root) {
        let attribute = match flavor {
            SchemaFlavor::DataSource => attribute.into_computed(),
            _ => attribute,
        };
        attributes.insert(name, attribute);
    }

    if flavor == SchemaFlavor::Manifest {
        attributes.insert(
            YAML.to_string(),
            Attribute::computed(AttributeKind::String)
                .description("The object rendered as a YAML manifest."),
        );
    }

    let description = root
        .description
        .clone()
        .unwrap_or_else(|| format!("{} ({})", crd.names.kind, api_version));

    let deprecation_message = version.deprecation_warning.clone().or_else(|| {
        version
            .deprecated
            .then(|| format!("{} {} is deprecated", api_version, crd.names.kind))
    });

    Schema {
        version: 0,
        description,
        deprecation_message,
        attributes,
    }
}

fn wait_for_attribute() -> Attribute {
    let mut condition = Attributes::new();
    condition.insert(
        "jsonpath".to_string(),
        Attribute::required(AttributeKind::String)
            .description("JSONPath expression evaluated against the object."),
    );
    condition.insert(
        "value".to_string(),
        Attribute::required(AttributeKind::String)
            .description("Value the expression must yield."),
    );
    Attribute::optional(AttributeKind::list(AttributeKind::object(condition)))
        .description("Conditions the object must satisfy before create or update completes.")
}

fn metadata_attribute(namespaced: bool, flavor: SchemaFlavor) -> Attribute {
    let mut metadata = Attributes::new();
    metadata.insert(
        "name".to_string(),
        Attribute::required(AttributeKind::String)
            .json("name")
            .description("Name of the object, unique within its namespace.")
            .replace_on_change()
            .validate_with(Validator::DnsSubdomain),
    );
    if namespaced {
        metadata.insert(
            "namespace".to_string(),
            Attribute::required(AttributeKind::String)
                .json("namespace")
                .description("Namespace of the object.")
                .replace_on_change()
                .validate_with(Validator::DnsLabel),
        );
    }

    let string_map = || AttributeKind::map(AttributeKind::String);
    let (labels, annotations) = match flavor {
        SchemaFlavor::DataSource => (
            Attribute::computed(string_map()),
            Attribute::computed(string_map()),
        ),
        _ => (
            Attribute::optional(string_map()),
            Attribute::optional(string_map()),
        ),
    };
    metadata.insert(
        "labels".to_string(),
        labels
            .json("labels")
            .description("Map of string keys and values used to organize and select objects."),
    );
    metadata.insert(
        "annotations".to_string(),
        annotations
            .json("annotations")
            .description("Unstructured key value map stored with the object."),
    );

    Attribute::required(AttributeKind::object(metadata))
        .json("metadata")
        .description("Standard object metadata.")
}

fn root_attributes(root: &SchemaProperty) -> Attributes {
    let mut attributes = Attributes::new();
    for (json_name, property) in &root.properties {
        if SKIPPED_PROPERTIES.contains(&json_name.as_str()) {
            continue;
        }
        let name = unique_name(terraform_name(json_name), |candidate| {
            is_reserved(candidate) || attributes.contains_key(candidate)
        });
        let attribute = property_attribute(json_name, property, root.is_required(json_name));
        attributes.insert(name, attribute);
    }
    attributes
}

fn object_attributes(property: &SchemaProperty) -> Attributes {
    let mut attributes = Attributes::new();
    for (json_name, nested) in &property.properties {
        let name = unique_name(terraform_name(json_name), |candidate| {
            attributes.contains_key(candidate)
        });
        let attribute = property_attribute(json_name, nested, property.is_required(json_name));
        attributes.insert(name, attribute);
    }
    attributes
}

/// Map one OpenAPI property to an attribute
pub fn property_attribute(json_name: &str, property: &SchemaProperty, required: bool) -> Attribute {
    let kind = property_kind(property);
    let attribute = if required {
        Attribute::required(kind)
    } else {
        Attribute::optional(kind)
    };
    let attribute = attribute
        .json(json_name)
        .maybe_description(property.description.clone());
    if property.int_or_string {
        attribute.int_or_string()
    } else {
        attribute
    }
}

fn property_kind(property: &SchemaProperty) -> AttributeKind {
    if property.int_or_string {
        return AttributeKind::String;
    }
    if (property.preserve_unknown_fields || property.embedded_resource) && !property.has_properties() {
        return AttributeKind::Dynamic;
    }

    match property.kind {
        PropertyKind::String => AttributeKind::String,
        PropertyKind::Integer => AttributeKind::Int64,
        PropertyKind::Number => AttributeKind::Float64,
        PropertyKind::Boolean => AttributeKind::Bool,
        PropertyKind::Array => AttributeKind::list(
            property
                .items
                .as_deref()
                .map_or(AttributeKind::Dynamic, property_kind),
        ),
        PropertyKind::Object if property.has_properties() => {
            AttributeKind::object(object_attributes(property))
        }
        PropertyKind::Object => AttributeKind::map(
            property
                .map_values()
                .map_or(AttributeKind::String, property_kind),
        ),
        PropertyKind::Unknown => AttributeKind::Dynamic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CrdParser;

    const CERTIFICATE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: certificates.cert-manager.io
spec:
  group: cert-manager.io
  names:
    kind: Certificate
    plural: certificates
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          description: A Certificate resource should be created to ensure an up to date and signed X.509 certificate is stored in the Kubernetes Secret resource named in `spec.secretName`.
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
              required: [issuerRef, secretName]
              properties:
                secretName:
                  type: string
                dnsNames:
                  type: array
                  items:
                    type: string
                isCA:
                  type: boolean
                duration:
                  type: string
                revisionHistoryLimit:
                  type: integer
                port:
                  x-kubernetes-int-or-string: true
                issuerRef:
                  type: object
                  required: [name]
                  properties:
                    name:
                      type: string
                    kind:
                      type: string
                    group:
                      type: string
                secretTemplate:
                  type: object
                  properties:
                    labels:
                      type: object
                      additionalProperties:
                        type: string
                extra:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
            status:
              type: object
              properties:
                ready:
                  type: boolean
"#;

    fn certificate() -> CrdSchema {
        CrdParser::parse(CERTIFICATE_CRD).unwrap()
    }

    fn schema(flavor: SchemaFlavor) -> Schema {
        let crd = certificate();
        let version = crd.versions[0].clone();
        generate_schema(&crd, &version, flavor)
    }

    #[test]
    fn test_resource_root_attributes() {
        let schema = schema(SchemaFlavor::Resource);
        let names: Vec<&str> = schema.attributes.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "id",
                "field_manager",
                "force_conflicts",
                "wait_for",
                "api_version",
                "kind",
                "metadata",
                "spec"
            ]
        );
        assert!(schema.attribute("id").unwrap().computed);
        assert!(schema.attribute("spec").unwrap().required);
        assert!(schema.attribute("status").is_none());
        assert!(schema.description.starts_with("A Certificate resource"));
    }

    #[test]
    fn test_metadata_requires_replace() {
        let schema = schema(SchemaFlavor::Resource);
        let name = schema.attribute("metadata.name").unwrap();
        assert!(name.required && name.requires_replace);
        let namespace = schema.attribute("metadata.namespace").unwrap();
        assert!(namespace.required && namespace.requires_replace);
        assert!(schema.attribute("metadata.labels").unwrap().optional);
    }

    #[test]
    fn test_cluster_scoped_has_no_namespace() {
        let mut crd = certificate();
        crd.scope = crate::crd::CrdScope::Cluster;
        let version = crd.versions[0].clone();
        let schema = generate_schema(&crd, &version, SchemaFlavor::Resource);
        assert!(schema.attribute("metadata.namespace").is_none());
        assert_eq!(
            schema.attribute("id").unwrap().description.as_deref(),
            Some("Identifier of the object, equal to its name.")
        );
    }

    #[test]
    fn test_property_mapping() {
        let schema = schema(SchemaFlavor::Resource);

        let secret_name = schema.attribute("spec.secret_name").unwrap();
        assert_eq!(secret_name.json_name.as_deref(), Some("secretName"));
        assert!(secret_name.required);

        assert_eq!(
            schema.attribute("spec.dns_names").unwrap().kind,
            AttributeKind::list(AttributeKind::String)
        );
        assert_eq!(
            schema.attribute("spec.is_ca").unwrap().kind,
            AttributeKind::Bool
        );
        assert_eq!(
            schema.attribute("spec.revision_history_limit").unwrap().kind,
            AttributeKind::Int64
        );

        let port = schema.attribute("spec.port").unwrap();
        assert_eq!(port.kind, AttributeKind::String);
        assert!(port.int_or_string);

        assert!(schema.attribute("spec.issuer_ref.name").unwrap().required);
        assert!(schema.attribute("spec.issuer_ref.kind").unwrap().optional);
        assert_eq!(
            schema.attribute("spec.secret_template.labels").unwrap().kind,
            AttributeKind::map(AttributeKind::String)
        );
        assert_eq!(
            schema.attribute("spec.extra").unwrap().kind,
            AttributeKind::Dynamic
        );
    }

    #[test]
    fn test_data_source_is_read_only() {
        let schema = schema(SchemaFlavor::DataSource);
        assert!(schema.attribute("field_manager").is_none());
        assert!(schema.attribute("wait_for").is_none());
        assert!(schema.attribute("metadata.name").unwrap().required);
        assert!(schema.attribute("metadata.labels").unwrap().computed);

        let spec = schema.attribute("spec").unwrap();
        assert!(spec.computed && !spec.required);
        assert!(schema.attribute("spec.secret_name").unwrap().computed);
    }

    #[test]
    fn test_manifest_flavor() {
        let schema = schema(SchemaFlavor::Manifest);
        assert!(schema.attribute("id").is_none());
        assert!(schema.attribute("force_conflicts").is_none());
        assert!(schema.attribute("yaml").unwrap().computed);
        assert!(schema.attribute("spec.secret_name").unwrap().required);
    }

    #[test]
    fn test_body_attributes() {
        let schema = schema(SchemaFlavor::Manifest);
        let body = body_attributes(&schema);
        assert_eq!(body.keys().collect::<Vec<_>>(), vec!["spec"]);
    }

    #[test]
    fn test_reserved_name_collision() {
        let mut root = SchemaProperty::default();
        root.properties.insert(
            "id".to_string(),
            SchemaProperty::of_kind(PropertyKind::String),
        );
        root.properties.insert(
            "spec".to_string(),
            SchemaProperty::of_kind(PropertyKind::String),
        );
        let attributes = root_attributes(&root);
        assert!(attributes.contains_key("id_2"));
        assert_eq!(attributes["id_2"].json_name.as_deref(), Some("id"));
    }

    #[test]
    fn test_deprecation_message() {
        let mut crd = certificate();
        crd.versions[0].deprecated = true;
        let version = crd.versions[0].clone();
        let schema = generate_schema(&crd, &version, SchemaFlavor::Resource);
        assert_eq!(
            schema.deprecation_message.as_deref(),
            Some("cert-manager.io/v1 Certificate is deprecated")
        );
    }

    #[test]
    fn test_flavor_parse() {
        assert_eq!(
            "data-source".parse::<SchemaFlavor>().unwrap(),
            SchemaFlavor::DataSource
        );
        assert_eq!(SchemaFlavor::Manifest.to_string(), "manifest");
        assert!("other".parse::<SchemaFlavor>().is_err());
    }
}
