//! Dynamic client seam
//!
//! Every lifecycle operation funnels through three verbs against a fixed
//! group/version/resource: Server-Side Apply PATCH, GET and DELETE.

use async_trait::async_trait;
use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams},
    discovery::ApiResource,
};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::error::Result;

/// Name and namespace of a single object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub name: String,
    /// `None` for cluster-scoped objects
    pub namespace: Option<String>,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Server-Side Apply options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyParams {
    pub field_manager: String,
    pub force: bool,
}

/// The three verbs the lifecycle needs from Kubernetes
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Server-Side Apply `object`, returning the object as stored
    async fn apply(
        &self,
        resource: &ApiResource,
        target: &ObjectRef,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value>;

    /// Fetch an object
    async fn get(&self, resource: &ApiResource, target: &ObjectRef) -> Result<Value>;

    /// Delete an object with background propagation
    async fn delete(&self, resource: &ApiResource, target: &ObjectRef) -> Result<()>;
}

/// `ResourceClient` backed by a kube-rs client
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, resource: &ApiResource, target: &ObjectRef) -> Api<DynamicObject> {
        match &target.namespace {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn apply(
        &self,
        resource: &ApiResource,
        target: &ObjectRef,
        object: &Value,
        params: &ApplyParams,
    ) -> Result<Value> {
        debug!(
            kind = %resource.kind,
            object = %target,
            field_manager = %params.field_manager,
            force = params.force,
            "server-side apply"
        );

        let mut patch_params = PatchParams::apply(&params.field_manager);
        patch_params.force = params.force;

        let applied = self
            .api(resource, target)
            .patch(&target.name, &patch_params, &Patch::Apply(object))
            .await?;
        Ok(serde_json::to_value(applied)?)
    }

    async fn get(&self, resource: &ApiResource, target: &ObjectRef) -> Result<Value> {
        debug!(kind = %resource.kind, object = %target, "get");
        let object = self.api(resource, target).get(&target.name).await?;
        Ok(serde_json::to_value(object)?)
    }

    async fn delete(&self, resource: &ApiResource, target: &ObjectRef) -> Result<()> {
        debug!(kind = %resource.kind, object = %target, "delete");
        self.api(resource, target)
            .delete(&target.name, &DeleteParams::background())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn certificates() -> ApiResource {
        ApiResource {
            group: "cert-manager.io".to_string(),
            version: "v1".to_string(),
            api_version: "cert-manager.io/v1".to_string(),
            kind: "Certificate".to_string(),
            plural: "certificates".to_string(),
        }
    }

    fn cluster_issuers() -> ApiResource {
        ApiResource {
            group: "cert-manager.io".to_string(),
            version: "v1".to_string(),
            api_version: "cert-manager.io/v1".to_string(),
            kind: "ClusterIssuer".to_string(),
            plural: "clusterissuers".to_string(),
        }
    }

    fn web() -> ObjectRef {
        ObjectRef::new("web", Some("default".to_string()))
    }

    fn stored_certificate() -> Value {
        json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "Certificate",
            "metadata": {"name": "web", "namespace": "default", "resourceVersion": "42"},
            "spec": {"secretName": "web-tls", "issuerRef": {"name": "letsencrypt"}}
        })
    }

    fn client_for(server: &MockServer) -> KubeResourceClient {
        let config = kube::Config::new(server.uri().parse().unwrap());
        KubeResourceClient::new(Client::try_from(config).unwrap())
    }

    fn not_found() -> ResponseTemplate {
        ResponseTemplate::new(404).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": "certificates.cert-manager.io \"web\" not found",
            "reason": "NotFound",
            "code": 404
        }))
    }

    #[test]
    fn test_object_ref_display() {
        assert_eq!(web().to_string(), "default/web");
        assert_eq!(ObjectRef::new("letsencrypt", None).to_string(), "letsencrypt");
    }

    #[tokio::test]
    async fn test_apply_sends_server_side_apply_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(
                "/apis/cert-manager.io/v1/namespaces/default/certificates/web",
            ))
            .and(query_param("fieldManager", "crdform"))
            .and(query_param("force", "true"))
            .and(body_partial_json(json!({"spec": {"secretName": "web-tls"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(stored_certificate()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let params = ApplyParams {
            field_manager: "crdform".to_string(),
            force: true,
        };
        let applied = client
            .apply(&certificates(), &web(), &stored_certificate(), &params)
            .await
            .unwrap();

        assert_eq!(applied["metadata"]["resourceVersion"], "42");
        assert_eq!(applied["spec"]["issuerRef"]["name"], "letsencrypt");
    }

    #[tokio::test]
    async fn test_get_cluster_scoped_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apis/cert-manager.io/v1/clusterissuers/letsencrypt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "cert-manager.io/v1",
                "kind": "ClusterIssuer",
                "metadata": {"name": "letsencrypt"},
                "spec": {"selfSigned": {}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let object = client
            .get(&cluster_issuers(), &ObjectRef::new("letsencrypt", None))
            .await
            .unwrap();
        assert_eq!(object["kind"], "ClusterIssuer");
        assert_eq!(object["spec"]["selfSigned"], json!({}));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/apis/cert-manager.io/v1/namespaces/default/certificates/web",
            ))
            .respond_with(not_found())
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get(&certificates(), &web())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_uses_background_propagation() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(
                "/apis/cert-manager.io/v1/namespaces/default/certificates/web",
            ))
            .and(body_partial_json(json!({"propagationPolicy": "Background"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(stored_certificate()))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete(&certificates(), &web())
            .await
            .unwrap();
    }
}
