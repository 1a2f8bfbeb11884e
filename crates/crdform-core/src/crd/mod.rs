//! CustomResourceDefinition parsing
//!
//! Resource types are derived from CRD manifests at runtime: the parser turns
//! a manifest into a `CrdSchema`, and each served version with an OpenAPI
//! schema becomes one resource type.

mod parser;
mod schema;

pub use parser::CrdParser;
pub use schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdScope, CrdVersionSchema, PropertyKind,
    SchemaProperty,
};
