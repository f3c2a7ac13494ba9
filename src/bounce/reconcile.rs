// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Single-pass reconciliation of one PodPreset against its deployments.

use crate::bounce::marker::{is_stale, marker, pod_template_labels, set_marker};
use crate::constants::events::REASON_BOUNCED;
use crate::error::{BouncerError, Result};
use crate::kubernetes::{Notification, Notifier, ObjectStore};
use crate::selector::Selector;
use crate::types::{NamespacedName, PodPreset};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Resource, ResourceExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

/// Collaborators of a reconciliation pass
pub struct Context {
    pub store: Arc<dyn ObjectStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl Context {
    pub fn new(store: Arc<dyn ObjectStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }
}

/// Result of a completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Names of the deployments bounced during this pass
    pub bounced: Vec<String>,
}

impl Outcome {
    pub fn is_noop(&self) -> bool {
        self.bounced.is_empty()
    }
}

/// Bounce every deployment governed by the preset `key` whose marker is stale.
///
/// A missing preset is a successful no-op. Every error is retryable; a failed
/// write aborts the pass and leaves earlier writes in place.
#[instrument(skip(key, ctx, cancel), fields(preset = %key))]
pub async fn reconcile(
    key: &NamespacedName,
    ctx: &Context,
    cancel: &CancellationToken,
) -> Result<Outcome> {
    let preset = match cancellable(cancel, ctx.store.get_preset(&key.namespace, &key.name)).await? {
        Some(preset) => preset,
        None => {
            debug!("PodPreset no longer exists, nothing to reconcile");
            return Ok(Outcome::default());
        }
    };

    let selector = Selector::compile(&preset.spec.selector)?;
    let preset_version = preset.current_version();
    let marker_key = preset.bounce_marker_key();

    let deployments = cancellable(
        cancel,
        ctx.store.list_deployments(&key.namespace, selector.label_filter()),
    )
    .await?;

    let mut outcome = Outcome::default();
    for (i, mut deployment) in deployments.into_iter().enumerate() {
        trace!("({}) Looking at deployment {}", i, deployment.name_any());

        // The list filter is only an optimization
        if !selector.matches(&pod_template_labels(&deployment)) {
            continue;
        }
        if !is_stale(marker(&deployment, &marker_key), &preset_version) {
            continue;
        }

        info!("Detected deployment '{}' needs bouncing", deployment.name_any());
        announce_bounce(ctx, &preset, &deployment, cancel).await?;

        set_marker(&mut deployment, &marker_key, &preset_version);
        cancellable(cancel, ctx.store.update_deployment(&deployment)).await?;

        outcome.bounced.push(deployment.name_any());
    }

    if outcome.is_noop() {
        debug!("No deployment needed bouncing");
    } else {
        info!("Bounced {} deployment(s): {:?}", outcome.bounced.len(), outcome.bounced);
    }

    Ok(outcome)
}

async fn announce_bounce(
    ctx: &Context,
    preset: &PodPreset,
    deployment: &Deployment,
    cancel: &CancellationToken,
) -> Result<()> {
    let deployment_version = deployment.resource_version().unwrap_or_default();

    ctx.notifier
        .notify(
            &preset.object_ref(&()),
            Notification::normal(
                REASON_BOUNCED,
                format!(
                    "Bounced {}-{} due to newly created or updated podpreset",
                    deployment.name_any(),
                    deployment_version
                ),
            ),
        )
        .await;

    if cancel.is_cancelled() {
        return Err(BouncerError::Cancelled);
    }

    ctx.notifier
        .notify(
            &deployment.object_ref(&()),
            Notification::normal(
                REASON_BOUNCED,
                format!(
                    "Bounced to newly created or updated podpreset {}-{}",
                    preset.name_any(),
                    preset.current_version()
                ),
            ),
        )
        .await;

    Ok(())
}

/// Await `fut` unless `cancel` fires first.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BouncerError::Cancelled),
        res = fut => res,
    }
}
