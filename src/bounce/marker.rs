// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounce marker bookkeeping on deployment pod templates

use k8s_openapi::api::apps::v1::Deployment;
use std::collections::BTreeMap;

/// Labels of the deployment's pod template, empty when unset
pub fn pod_template_labels(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.labels.clone())
        .unwrap_or_default()
}

/// Current bounce marker value for `key`, if any
pub fn marker<'a>(deployment: &'a Deployment, key: &str) -> Option<&'a str> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.annotations.as_ref())
        .and_then(|a| a.get(key))
        .map(String::as_str)
}

/// Whether a deployment carrying `marker` must be bounced for `preset_version`.
///
/// Versions are compared as strings, so `"9"` sorts after `"10"`.
pub fn is_stale(marker: Option<&str>, preset_version: &str) -> bool {
    match marker {
        None => true,
        Some(bounced) => bounced < preset_version,
    }
}

/// Set the bounce marker on the pod template; changing the template rolls the deployment.
pub fn set_marker(deployment: &mut Deployment, key: &str, preset_version: &str) {
    deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .metadata
        .get_or_insert_with(Default::default)
        .annotations
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), preset_version.to_string());
}
