// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Object store access for presets and deployments

use crate::error::{BouncerError, Result};
use crate::types::PodPreset;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    api::{ListParams, PostParams},
    core::Selector,
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

/// Reads presets and reads/writes deployments.
///
/// `update_deployment` must reject writes against a stale copy with
/// [`BouncerError::Conflict`] instead of overwriting.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a preset, `None` when it does not exist.
    async fn get_preset(&self, namespace: &str, name: &str) -> Result<Option<PodPreset>>;

    /// List deployments in a namespace. `label_filter` narrows the listing
    /// server-side but callers must not rely on it being applied.
    async fn list_deployments(
        &self,
        namespace: &str,
        label_filter: Option<&Selector>,
    ) -> Result<Vec<Deployment>>;

    /// Write a deployment back, returning the stored object.
    async fn update_deployment(&self, deployment: &Deployment) -> Result<Deployment>;
}

/// [`ObjectStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    #[instrument(skip(self))]
    async fn get_preset(&self, namespace: &str, name: &str) -> Result<Option<PodPreset>> {
        let presets: Api<PodPreset> = Api::namespaced(self.client.clone(), namespace);

        match presets.get(name).await {
            Ok(preset) => Ok(Some(preset)),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("PodPreset {}/{} not found", namespace, name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_deployments(
        &self,
        namespace: &str,
        label_filter: Option<&Selector>,
    ) -> Result<Vec<Deployment>> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let lp = match label_filter {
            Some(selector) => ListParams::default().labels_from(selector),
            None => ListParams::default(),
        };

        Ok(deployments.list(&lp).await?.items)
    }

    #[instrument(skip(self, deployment), fields(deployment = %deployment.name_any()))]
    async fn update_deployment(&self, deployment: &Deployment) -> Result<Deployment> {
        let name = deployment
            .metadata
            .name
            .as_deref()
            .ok_or(BouncerError::MissingObjectKey(".metadata.name"))?;
        let namespace = deployment
            .namespace()
            .ok_or(BouncerError::MissingObjectKey(".metadata.namespace"))?;
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), &namespace);

        // Replace carries the observed resourceVersion, so the API server
        // refuses to overwrite a newer copy
        match deployments
            .replace(name, &PostParams::default(), deployment)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(kube::Error::Api(err)) if err.code == 409 => {
                Err(BouncerError::Conflict(format!("{}/{}", namespace, name)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
