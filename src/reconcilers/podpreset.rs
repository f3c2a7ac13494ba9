// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! PodPreset reconciler - watches PodPresets and bounces the deployments they govern.

use crate::bounce::{self, Outcome};
use crate::config::Config;
use crate::constants::CONTROLLER_NAME;
use crate::error::{BouncerError, Result};
use crate::kubernetes::{KubeNotifier, KubeStore};
use crate::types::{NamespacedName, PodPreset};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shared state handed to every reconciliation
pub struct ReconcileContext {
    bounce: bounce::Context,
    config: Config,
    shutdown: CancellationToken,
}

impl ReconcileContext {
    pub fn new(bounce: bounce::Context, config: Config, shutdown: CancellationToken) -> Self {
        Self {
            bounce,
            config,
            shutdown,
        }
    }
}

pub struct PodPresetReconciler {
    client: Client,
    config: Config,
    shutdown: CancellationToken,
}

impl PodPresetReconciler {
    pub fn new(client: Client, config: Config, shutdown: CancellationToken) -> Self {
        Self {
            client,
            config,
            shutdown,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let presets: Api<PodPreset> = match &self.config.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };

        let bounce_ctx = bounce::Context::new(
            Arc::new(KubeStore::new(self.client.clone())),
            Arc::new(KubeNotifier::new(
                self.client.clone(),
                CONTROLLER_NAME,
                self.config.pod_name.clone(),
            )),
        );
        let shutdown = self.shutdown.clone();
        let context = Arc::new(ReconcileContext::new(bounce_ctx, self.config, self.shutdown));

        Controller::new(presets, WatcherConfig::default())
            .graceful_shutdown_on(async move { shutdown.cancelled().await })
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled podpreset: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        info!("PodPreset reconciler stopped");
        Ok(())
    }
}

async fn reconcile(preset: Arc<PodPreset>, ctx: Arc<ReconcileContext>) -> Result<Action> {
    let key = NamespacedName::from_resource(preset.as_ref())?;
    reconcile_key(&key, &ctx).await?;

    // Presets are re-read on every change; nothing to poll for in between
    Ok(Action::await_change())
}

/// Run one bounce pass for `key`, bounded by the configured timeout and process shutdown
pub async fn reconcile_key(key: &NamespacedName, ctx: &ReconcileContext) -> Result<Outcome> {
    let cancel = ctx.shutdown.child_token();
    let timeout = ctx.config.reconcile_timeout();

    match tokio::time::timeout(timeout, bounce::reconcile(key, &ctx.bounce, &cancel)).await {
        Ok(res) => res,
        Err(_) => {
            cancel.cancel();
            Err(BouncerError::Timeout(timeout))
        }
    }
}

fn error_policy(
    _preset: Arc<PodPreset>,
    error: &BouncerError,
    ctx: Arc<ReconcileContext>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(error.retry_after(ctx.config.error_requeue()))
}
