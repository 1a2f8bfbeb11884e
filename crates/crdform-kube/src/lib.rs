//! crdform Kube - Kubernetes side of crdform
//!
//! This crate provides:
//! - **Dynamic Client**: Server-Side Apply, GET and DELETE behind the `ResourceClient` trait
//! - **Mock Client**: In-memory objects with simulated controllers for tests
//! - **Registry**: Resource types from the embedded CRD catalog and from CRD files
//! - **Lifecycle**: Create, Read, Update, Delete and ImportState for every CRD version
//! - **Data Sources**: Object lookup and offline manifest rendering
//! - **Waiting**: JSONPath conditions polled after create and update

pub mod catalog;
pub mod client;
pub mod config;
pub mod data_source;
pub mod definition;
pub mod error;
pub mod mock;
pub mod provider;
pub mod registry;
pub mod resource;
pub mod wait;

pub use client::{ApplyParams, KubeResourceClient, ObjectRef, ResourceClient};
pub use config::ProviderConfig;
pub use data_source::{CrdDataSource, ManifestDataSource};
pub use definition::ResourceDefinition;
pub use error::{KubeError, Result};
pub use mock::{MockResourceClient, OperationCounts};
pub use provider::{Provider, ResourceTypeInfo};
pub use registry::Registry;
pub use resource::{CrdResource, ResourceDefaults, ResourceResponse, validate_config};
pub use wait::{ConditionWaiter, WaitSettings};
