// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::{Client, CustomResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use podpreset_bouncer::config::Config;
use podpreset_bouncer::kubernetes::wait_for_podpreset_crd;
use podpreset_bouncer::reconcilers::PodPresetReconciler;
use podpreset_bouncer::types::PodPreset;

#[tokio::main]
async fn main() -> Result<()> {
    // `podpreset-bouncer crd` prints the CustomResourceDefinition and exits
    if std::env::args().nth(1).as_deref() == Some("crd") {
        let crd = serde_yaml::to_string(&PodPreset::crd()).context("Failed to render CRD")?;
        print!("{}", crd);
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting PodPreset bouncer");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, error_requeue_secs={}, reconcile_timeout_secs={}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.error_requeue_secs,
        config.reconcile_timeout_secs
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Wait for the PodPreset CRD before starting the reconciler
    info!("Waiting for PodPreset CRD to become available...");
    wait_for_podpreset_crd(&client).await?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                signal.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    info!("Starting reconciler...");
    PodPresetReconciler::new(client, config, shutdown).run().await?;

    info!("Shutdown complete");
    Ok(())
}
