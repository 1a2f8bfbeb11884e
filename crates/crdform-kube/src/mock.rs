//! Mock resource client for testing
//!
//! Objects live in memory, so lifecycle operations can be exercised without
//! a Kubernetes cluster. Status updates normally written by controllers can
//! be simulated with [`MockResourceClient::set_status`] and
//! [`MockResourceClient::set_status_after_gets`].

use async_trait::async_trait;
use kube::discovery::ApiResource;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::client::{ApplyParams, ObjectRef, ResourceClient};
use crate::error::{KubeError, Result};

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub applies: usize,
    pub gets: usize,
    pub deletes: usize,
}

#[derive(Debug, Clone)]
struct PendingStatus {
    remaining_gets: usize,
    status: Value,
}

/// In-memory `ResourceClient`
#[derive(Clone, Default)]
pub struct MockResourceClient {
    /// Storage: "<plural>.<group>/<namespace>/<name>" -> object
    store: Arc<RwLock<HashMap<String, Value>>>,
    operations: Arc<RwLock<OperationCounts>>,
    /// Errors returned by the next calls, as (code, reason, message)
    failures: Arc<RwLock<Vec<(u16, String, String)>>>,
    last_apply: Arc<RwLock<Option<ApplyParams>>>,
    pending: Arc<RwLock<HashMap<String, PendingStatus>>>,
    next_uid: Arc<RwLock<u64>>,
}

fn key(resource: &ApiResource, target: &ObjectRef) -> String {
    format!(
        "{}.{}/{}/{}",
        resource.plural,
        resource.group,
        target.namespace.as_deref().unwrap_or(""),
        target.name
    )
}

fn not_found(resource: &ApiResource, target: &ObjectRef) -> KubeError {
    let qualified = if resource.group.is_empty() {
        resource.plural.clone()
    } else {
        format!("{}.{}", resource.plural, resource.group)
    };
    KubeError::api_status(
        404,
        "NotFound",
        format!("{} \"{}\" not found", qualified, target.name),
    )
}

/// Non-metadata, non-status content of an object
fn desired_content(object: &Value) -> Value {
    match object {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !matches!(k.as_str(), "metadata" | "status"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn counter(metadata: &Value, field: &str) -> u64 {
    match metadata.get(field) {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

impl MockResourceClient {
    /// Create a new empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly, as if created outside Terraform
    pub fn insert(&self, resource: &ApiResource, object: Value) {
        let target = ObjectRef::new(
            object["metadata"]["name"].as_str().unwrap_or_default(),
            object["metadata"]["namespace"].as_str().map(str::to_string),
        );
        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key(resource, &target), object);
    }

    /// Current stored object
    pub fn object(&self, resource: &ApiResource, target: &ObjectRef) -> Option<Value> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key(resource, target))
            .cloned()
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        *self
            .operations
            .write()
            .unwrap_or_else(PoisonError::into_inner) = OperationCounts::default();
    }

    /// Parameters of the most recent apply
    pub fn last_apply_params(&self) -> Option<ApplyParams> {
        self.last_apply
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make the next call fail with an API error
    pub fn fail_next(&self, code: u16, reason: &str, message: &str) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((code, reason.to_string(), message.to_string()));
    }

    /// Overwrite the status of a stored object
    pub fn set_status(&self, resource: &ApiResource, target: &ObjectRef, status: Value) {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(Value::Object(object)) = store.get_mut(&key(resource, target)) {
            object.insert("status".to_string(), status);
        }
    }

    /// Set the status once the object has been fetched `gets` more times
    pub fn set_status_after_gets(
        &self,
        resource: &ApiResource,
        target: &ObjectRef,
        status: Value,
        gets: usize,
    ) {
        self.pending
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key(resource, target),
                PendingStatus {
                    remaining_gets: gets,
                    status,
                },
            );
    }

    fn take_failure(&self) -> Option<KubeError> {
        let mut failures = self.failures.write().unwrap_or_else(PoisonError::into_inner);
        if failures.is_empty() {
            return None;
        }
        let (code, reason, message) = failures.remove(0);
        Some(KubeError::api_status(code, &reason, message))
    }

    fn count(&self, update: impl FnOnce(&mut OperationCounts)) {
        update(&mut self.operations.write().unwrap_or_else(PoisonError::into_inner));
    }

    fn next_uid(&self) -> String {
        let mut uid = self.next_uid.write().unwrap_or_else(PoisonError::into_inner);
        *uid += 1;
        format!("00000000-0000-0000-0000-{:012}", *uid)
    }

    fn advance_pending(&self, key: &str) {
        let mut pending = self.pending.write().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = pending.get_mut(key) else {
            return;
        };
        if entry.remaining_gets > 0 {
            entry.remaining_gets -= 1;
            return;
        }
        let status = entry.status.clone();
        pending.remove(key);
        drop(pending);

        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(Value::Object(object)) = store.get_mut(key) {
            object.insert("status".to_string(), status);
        }
    }
}

#[async_trait]
impl ResourceClient for MockResourceClient {
    async fn apply(
        &self,
        resource: &ApiResource,
        target: &ObjectRef,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value> {
        self.count(|ops| ops.applies += 1);
        *self
            .last_apply
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(params.clone());
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        let key = key(resource, target);
        let existing = self
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        let mut stored = object.clone();
        let uid = match &existing {
            Some(existing) => existing["metadata"]["uid"].clone(),
            None => Value::String(self.next_uid()),
        };
        let (resource_version, generation) = match &existing {
            Some(existing) => {
                let metadata = &existing["metadata"];
                let changed = desired_content(existing) != desired_content(object);
                (
                    counter(metadata, "resourceVersion") + 1,
                    counter(metadata, "generation") + u64::from(changed),
                )
            }
            None => (1, 1),
        };

        if let Some(metadata) = stored.get_mut("metadata").and_then(Value::as_object_mut) {
            metadata.insert("uid".to_string(), uid);
            metadata.insert(
                "resourceVersion".to_string(),
                Value::String(resource_version.to_string()),
            );
            metadata.insert("generation".to_string(), json!(generation));
        }
        if let Some(status) = existing.as_ref().and_then(|e| e.get("status"))
            && let Some(map) = stored.as_object_mut()
        {
            map.insert("status".to_string(), status.clone());
        }

        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, stored.clone());
        Ok(stored)
    }

    async fn get(&self, resource: &ApiResource, target: &ObjectRef) -> Result<Value> {
        self.count(|ops| ops.gets += 1);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        let key = key(resource, target);
        self.advance_pending(&key);
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(resource, target))
    }

    async fn delete(&self, resource: &ApiResource, target: &ObjectRef) -> Result<()> {
        self.count(|ops| ops.deletes += 1);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key(resource, target))
            .map(|_| ())
            .ok_or_else(|| not_found(resource, target))
    }
}
