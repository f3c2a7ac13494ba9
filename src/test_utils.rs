// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked API server, an in-memory object store and object builders.

use crate::error::{BouncerError, Result};
use crate::kubernetes::{Notification, Notifier, ObjectStore};
use crate::types::{PodPreset, PodPresetSpec};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{ObjectReference, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::core::{ErrorResponse, Selector};
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;
use tower::Service;

#[derive(Clone)]
enum Reply {
    Fixed(u16, String),
    /// Answer 200 with the request body
    Echo,
}

/// A request seen by [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Bytes,
}

/// A mock HTTP service that returns predefined responses based on request paths
/// and records every request it receives.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), Reply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, reply: Reply) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), reply);
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, Reply::Fixed(status, body.to_string()))
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, Reply::Fixed(status, body.to_string()))
    }

    /// Answer PUT requests on the path with the submitted object
    pub fn echo_put(self, path: &str) -> Self {
        self.on("PUT", path, Reply::Echo)
    }

    /// Answer POST requests on the path with the submitted object
    pub fn echo_post(self, path: &str) -> Self {
        self.on("POST", path, Reply::Echo)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<Reply> {
        let responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(reply) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(reply.clone());
        }

        // Try prefix match for paths like /apis/apps/v1/namespaces/foo
        for ((m, p), reply) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(reply.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let (parts, body) = req.into_parts();
        let method = parts.method.to_string();
        let path = parts.uri.path().to_string();
        let query = parts.uri.query().unwrap_or_default().to_string();

        let reply = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = body
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();

            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                query,
                body: body.clone(),
            });

            let (status, payload) = match reply {
                Some(Reply::Fixed(status, payload)) => (status, payload.into_bytes()),
                Some(Reply::Echo) => (200, body.to_vec()),
                // Default 404 for unmatched requests
                None => (404, status_json(404, "NotFound").into_bytes()),
            };

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(payload))
                .unwrap())
        })
    }
}

/// A failed Status response body
pub fn status_json(code: u16, reason: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("mock {}", reason),
        "reason": reason,
        "code": code
    })
    .to_string()
}

fn string_map(pairs: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
    (!pairs.is_empty()).then(|| {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    })
}

/// A PodPreset selecting on `match_labels`; no labels selects everything
pub fn preset(
    name: &str,
    namespace: &str,
    resource_version: &str,
    match_labels: &[(&str, &str)],
) -> PodPreset {
    PodPreset {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some(resource_version.to_string()),
            ..Default::default()
        },
        spec: PodPresetSpec {
            selector: LabelSelector {
                match_labels: string_map(match_labels),
                match_expressions: None,
            },
            ..Default::default()
        },
    }
}

/// A Deployment whose pod template carries `labels` and `annotations`
pub fn deployment(
    name: &str,
    namespace: &str,
    resource_version: &str,
    labels: &[(&str, &str)],
    annotations: &[(&str, &str)],
) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some(resource_version.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: string_map(labels),
                match_expressions: None,
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: string_map(labels),
                    annotations: string_map(annotations),
                    ..Default::default()
                }),
                spec: None,
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// [`preset`] as the API server would return it
pub fn preset_json(
    name: &str,
    namespace: &str,
    resource_version: &str,
    match_labels: &[(&str, &str)],
) -> serde_json::Value {
    let mut value =
        serde_json::to_value(preset(name, namespace, resource_version, match_labels)).unwrap();
    value["apiVersion"] = serde_json::json!("settings.svcat.k8s.io/v1alpha1");
    value["kind"] = serde_json::json!("PodPreset");
    value
}

/// [`deployment`] without annotations, as the API server would return it
pub fn deployment_json(
    name: &str,
    namespace: &str,
    resource_version: &str,
    labels: &[(&str, &str)],
) -> serde_json::Value {
    let mut value =
        serde_json::to_value(deployment(name, namespace, resource_version, labels, &[])).unwrap();
    value["apiVersion"] = serde_json::json!("apps/v1");
    value["kind"] = serde_json::json!("Deployment");
    value
}

fn injected_failure() -> BouncerError {
    BouncerError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "injected failure".to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

#[derive(Default)]
struct StoreState {
    presets: BTreeMap<(String, String), PodPreset>,
    deployments: BTreeMap<(String, String), Deployment>,
    updates: Vec<String>,
    label_filters: Vec<Option<String>>,
    failing_reads: bool,
    stalled_listing: bool,
    failing_updates: HashSet<String>,
    modified_before_update: HashSet<String>,
}

/// An [`ObjectStore`] with per-object optimistic concurrency and failure injection.
///
/// Listing ignores the label filter and returns every deployment of the namespace,
/// ordered by name.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn with_preset(mut self, preset: PodPreset) -> Self {
        let key = (preset.namespace().unwrap_or_default(), preset.name_any());
        self.state.get_mut().unwrap().presets.insert(key, preset);
        self
    }

    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        let key = (deployment.namespace().unwrap_or_default(), deployment.name_any());
        self.state.get_mut().unwrap().deployments.insert(key, deployment);
        self
    }

    /// Every preset read fails
    pub fn failing_reads(mut self) -> Self {
        self.state.get_mut().unwrap().failing_reads = true;
        self
    }

    /// Listing deployments never completes
    pub fn stalled_listing(mut self) -> Self {
        self.state.get_mut().unwrap().stalled_listing = true;
        self
    }

    /// Every write of the named deployment fails
    pub fn failing_update_of(mut self, name: &str) -> Self {
        self.state
            .get_mut()
            .unwrap()
            .failing_updates
            .insert(name.to_string());
        self
    }

    /// A concurrent writer changes the named deployment right before our first write
    pub fn modified_before_update(mut self, name: &str) -> Self {
        self.state
            .get_mut()
            .unwrap()
            .modified_before_update
            .insert(name.to_string());
        self
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state
            .lock()
            .unwrap()
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// `namespace/name` of every successful write, in order
    pub fn updates(&self) -> Vec<String> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Label filters passed to every list call, in order
    pub fn label_filters(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().label_filters.clone()
    }
}

fn bump_version(deployment: &mut Deployment) {
    let next = deployment
        .resource_version()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    deployment.metadata.resource_version = Some(next.to_string());
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get_preset(&self, namespace: &str, name: &str) -> Result<Option<PodPreset>> {
        let state = self.state.lock().unwrap();
        if state.failing_reads {
            return Err(injected_failure());
        }
        Ok(state
            .presets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_filter: Option<&Selector>,
    ) -> Result<Vec<Deployment>> {
        let stalled = {
            let mut state = self.state.lock().unwrap();
            state.label_filters.push(label_filter.map(|s| s.to_string()));
            state.stalled_listing
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let state = self.state.lock().unwrap();
        Ok(state
            .deployments
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn update_deployment(&self, deployment: &Deployment) -> Result<Deployment> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let namespace = deployment.namespace().unwrap_or_default();
        let name = deployment.name_any();

        if state.failing_updates.contains(&name) {
            return Err(injected_failure());
        }

        let stored = state
            .deployments
            .get_mut(&(namespace.clone(), name.clone()))
            .ok_or_else(|| {
                BouncerError::KubeError(kube::Error::Api(ErrorResponse {
                    status: "Failure".to_string(),
                    message: format!("deployments.apps \"{}\" not found", name),
                    reason: "NotFound".to_string(),
                    code: 404,
                }))
            })?;

        if state.modified_before_update.remove(&name) {
            bump_version(stored);
        }

        if stored.resource_version() != deployment.resource_version() {
            return Err(BouncerError::Conflict(format!("{}/{}", namespace, name)));
        }

        let mut updated = deployment.clone();
        bump_version(&mut updated);
        *stored = updated.clone();
        state.updates.push(format!("{}/{}", namespace, name));

        Ok(updated)
    }
}

/// A [`Notifier`] remembering every notification
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ObjectReference, Notification)>>,
    cancel_on_notify: Option<CancellationToken>,
}

impl RecordingNotifier {
    /// Cancels `token` on every delivered notification
    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            cancel_on_notify: Some(token),
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> Vec<(ObjectReference, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &ObjectReference, notification: Notification) {
        self.sent
            .lock()
            .unwrap()
            .push((subject.clone(), notification));
        if let Some(token) = &self.cancel_on_notify {
            token.cancel();
        }
    }
}
