//! Terraform attribute schema
//!
//! Every attribute knows the JSON field it maps to, so one generic converter
//! can move values between Terraform state (snake_case) and Kubernetes
//! objects (camelCase).

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::diagnostics::{Diagnostic, Diagnostics};

/// Attributes of one object level, in declaration order
pub type Attributes = IndexMap<String, Attribute>;

static DNS_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid DNS subdomain pattern")
});

static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid DNS label pattern"));

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Int64,
    Float64,
    Bool,
    /// Arbitrary JSON, stored as-is
    Dynamic,
    List { element: Box<AttributeKind> },
    Map { element: Box<AttributeKind> },
    Object { attributes: Attributes },
}

impl AttributeKind {
    pub fn list(element: AttributeKind) -> Self {
        Self::List {
            element: Box::new(element),
        }
    }

    pub fn map(element: AttributeKind) -> Self {
        Self::Map {
            element: Box::new(element),
        }
    }

    pub fn object(attributes: Attributes) -> Self {
        Self::Object { attributes }
    }

    /// Human-readable type, as used in validation messages
    pub fn type_name(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Int64 => "number".to_string(),
            Self::Float64 => "number".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Dynamic => "dynamic".to_string(),
            Self::List { element } => format!("list({})", element.type_name()),
            Self::Map { element } => format!("map({})", element.type_name()),
            Self::Object { .. } => "object".to_string(),
        }
    }

    fn into_computed(self) -> Self {
        match self {
            Self::List { element } => Self::list(element.into_computed()),
            Self::Map { element } => Self::map(element.into_computed()),
            Self::Object { attributes } => Self::object(
                attributes
                    .into_iter()
                    .map(|(name, attribute)| (name, attribute.into_computed()))
                    .collect(),
            ),
            scalar => scalar,
        }
    }
}

/// Extra value checks beyond the type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// RFC 1123 subdomain, used for object names
    DnsSubdomain,
    /// RFC 1123 label, used for namespaces
    DnsLabel,
}

impl Validator {
    fn check(self, value: &str) -> Option<String> {
        let (pattern, what, max) = match self {
            Self::DnsSubdomain => (&*DNS_SUBDOMAIN, "a lowercase RFC 1123 subdomain", 253),
            Self::DnsLabel => (&*DNS_LABEL, "a lowercase RFC 1123 label", 63),
        };
        if value.len() > max {
            Some(format!("must be no more than {} characters", max))
        } else if !pattern.is_match(value) {
            Some(format!("\"{}\" must be {}", value, what))
        } else {
            None
        }
    }
}

/// A single Terraform attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub kind: AttributeKind,
    /// JSON field in the Kubernetes object; `None` for Terraform-only attributes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Changing the value forces a new resource
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_replace: bool,
    /// Kubernetes int-or-string field represented as a string
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub int_or_string: bool,
    #[serde(skip)]
    pub validator: Option<Validator>,
}

impl Attribute {
    fn new(kind: AttributeKind, required: bool, optional: bool, computed: bool) -> Self {
        Self {
            kind,
            json_name: None,
            description: None,
            required,
            optional,
            computed,
            requires_replace: false,
            int_or_string: false,
            validator: None,
        }
    }

    pub fn required(kind: AttributeKind) -> Self {
        Self::new(kind, true, false, false)
    }

    pub fn optional(kind: AttributeKind) -> Self {
        Self::new(kind, false, true, false)
    }

    pub fn computed(kind: AttributeKind) -> Self {
        Self::new(kind, false, false, true)
    }

    /// Optional attribute that the provider fills in when unset
    pub fn optional_computed(kind: AttributeKind) -> Self {
        Self::new(kind, false, true, true)
    }

    pub fn json(mut self, name: impl Into<String>) -> Self {
        self.json_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn maybe_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn replace_on_change(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn int_or_string(mut self) -> Self {
        self.int_or_string = true;
        self
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Turn this attribute (and everything below it) into a read-only one
    pub fn into_computed(self) -> Self {
        Self {
            kind: self.kind.into_computed(),
            required: false,
            optional: false,
            computed: true,
            ..self
        }
    }
}

/// One step of an attribute path
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathStep {
    Attribute(String),
    Index(usize),
    Key(String),
}

/// Location of a value inside a state, e.g. `spec.dns_names[0]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn attribute(&self, name: &str) -> Self {
        self.with(PathStep::Attribute(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(PathStep::Index(index))
    }

    pub fn key(&self, key: &str) -> Self {
        self.with(PathStep::Key(key.to_string()))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn with(&self, step: PathStep) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        Self(steps)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attribute(name) => write!(f, ".{}", name)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
                PathStep::Key(key) => write!(f, "[\"{}\"]", key)?,
            }
        }
        Ok(())
    }
}

/// Name of a JSON value's type, for messages
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Schema of a resource, data source or manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    pub attributes: Attributes,
}

impl Schema {
    /// Look up an attribute by dotted path, descending through nested
    /// objects and lists/maps of objects
    pub fn attribute(&self, path: &str) -> Option<&Attribute> {
        let mut parts = path.split('.');
        let mut current = self.attributes.get(parts.next()?)?;
        for part in parts {
            current = nested_attributes(&current.kind)?.get(part)?;
        }
        Some(current)
    }

    /// A state in which every top-level attribute is null
    pub fn null_state(&self) -> Map<String, Value> {
        self.attributes
            .keys()
            .map(|name| (name.clone(), Value::Null))
            .collect()
    }

    /// Validate a configuration against this schema
    ///
    /// Reports unknown attributes, missing required attributes, type
    /// mismatches and failed value checks.
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        match config.as_object() {
            Some(object) => validate_object(
                &self.attributes,
                object,
                &AttributePath::root(),
                &mut diagnostics,
            ),
            None => diagnostics.add_error(
                "Invalid configuration",
                format!("Expected an object, got {}.", json_type(config)),
            ),
        }
        diagnostics
    }
}

fn nested_attributes(kind: &AttributeKind) -> Option<&Attributes> {
    match kind {
        AttributeKind::Object { attributes } => Some(attributes),
        AttributeKind::List { element } | AttributeKind::Map { element } => {
            nested_attributes(element)
        }
        _ => None,
    }
}

fn validate_object(
    attributes: &Attributes,
    object: &Map<String, Value>,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) {
    for name in object.keys() {
        if !attributes.contains_key(name) {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported attribute",
                    format!("An attribute named \"{}\" is not expected here.", name),
                )
                .at(path.attribute(name)),
            );
        }
    }

    for (name, attribute) in attributes {
        let attribute_path = path.attribute(name);
        match object.get(name) {
            None | Some(Value::Null) => {
                if attribute.required {
                    diagnostics.push(
                        Diagnostic::error(
                            "Missing required attribute",
                            format!(
                                "The attribute \"{}\" is required, but no definition was found.",
                                attribute_path
                            ),
                        )
                        .at(&attribute_path),
                    );
                }
            }
            Some(value) if attribute.int_or_string => match value {
                Value::String(_) => {}
                Value::Number(n) if is_integral(n) => {}
                value => diagnostics.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!(
                            "Inappropriate value for attribute \"{}\": string or integer required, got {}.",
                            attribute_path,
                            json_type(value)
                        ),
                    )
                    .at(&attribute_path),
                ),
            },
            Some(value) => {
                validate_value(&attribute.kind, value, &attribute_path, diagnostics);
                if let (Some(validator), Some(text)) = (attribute.validator, value.as_str())
                    && let Some(problem) = validator.check(text)
                {
                    diagnostics.push(
                        Diagnostic::error("Invalid attribute value", problem).at(&attribute_path),
                    );
                }
            }
        }
    }
}

fn validate_value(
    kind: &AttributeKind,
    value: &Value,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) {
    match (kind, value) {
        (_, Value::Null) | (AttributeKind::Dynamic, _) => {}
        (AttributeKind::String, Value::String(_)) | (AttributeKind::Bool, Value::Bool(_)) => {}
        (AttributeKind::Float64, Value::Number(_)) => {}
        (AttributeKind::Int64, Value::Number(n)) if is_integral(n) => {}
        (AttributeKind::List { element }, Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                validate_value(element, item, &path.index(i), diagnostics);
            }
        }
        (AttributeKind::Map { element }, Value::Object(entries)) => {
            for (key, entry) in entries {
                validate_value(element, entry, &path.key(key), diagnostics);
            }
        }
        (AttributeKind::Object { attributes }, Value::Object(object)) => {
            validate_object(attributes, object, path, diagnostics);
        }
        (kind, value) => diagnostics.push(
            Diagnostic::error(
                "Incorrect attribute value type",
                format!(
                    "Inappropriate value for attribute \"{}\": {} required, got {}.",
                    path,
                    kind.type_name(),
                    json_type(value)
                ),
            )
            .at(path),
        ),
    }
}

pub(crate) fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64()
        || n
            .as_f64()
            .is_some_and(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
}
