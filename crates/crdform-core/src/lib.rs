//! crdform Core - CRD-derived Terraform schemas and state
//!
//! This crate provides:
//! - **CRD Parsing**: Structured view of CustomResourceDefinition manifests
//! - **Attribute Schemas**: Terraform attribute trees with validation
//! - **Schema Generation**: Resource, data source and manifest flavors per CRD version
//! - **Conversion**: snake_case Terraform state to camelCase Kubernetes JSON and back
//! - **Resource Model**: The typed bookkeeping fields shared by every resource
//! - **JSONPath**: The subset used by `wait_for` conditions

pub mod attribute;
pub mod convert;
pub mod crd;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod jsonpath;
pub mod model;
pub mod naming;

pub use attribute::{Attribute, AttributeKind, AttributePath, Attributes, Schema, Validator};
pub use convert::{object_to_state, state_to_object};
pub use crd::{CrdParser, CrdSchema, CrdScope, CrdVersionSchema};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CoreError, Result};
pub use generate::{SchemaFlavor, generate_schema};
pub use jsonpath::JsonPath;
pub use model::{Metadata, ResourceModel, WaitCondition, format_id, parse_import_id};
pub use naming::{resource_type_name, terraform_name, to_snake_case};
