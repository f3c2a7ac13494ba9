// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::annotations;
use k8s_openapi::api::core::v1::{EnvFromSource, EnvVar, Volume, VolumeMount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// Settings injected into pods whose labels match `selector`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "settings.svcat.k8s.io", version = "v1alpha1", kind = "PodPreset")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct PodPresetSpec {
    #[serde(default)]
    pub selector: LabelSelector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_from: Option<Vec<EnvFromSource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,
}

impl PodPreset {
    /// Pod template annotation recording the version of this preset that last bounced a workload
    pub fn bounce_marker_key(&self) -> String {
        format!("{}{}", annotations::BOUNCED_PREFIX, self.name_any())
    }

    /// The resourceVersion of this preset, empty when the object was never persisted
    pub fn current_version(&self) -> String {
        self.resource_version().unwrap_or_default()
    }
}
