// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use crate::types::PodPreset;
use kube::{discovery::Discovery, Client, Resource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for the PodPreset CRD to be served by the API server.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_podpreset_crd(client: &Client) -> Result<()> {
    let api_version = PodPreset::api_version(&());
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_podpreset_crd_exists(client).await {
            Ok(true) => {
                info!("PodPreset CRD ({}) is available", api_version);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "PodPreset CRD ({}) not yet available, waiting {} seconds...",
                    api_version, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for PodPreset CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = next_interval(interval);
    }
}

fn next_interval(interval: u64) -> u64 {
    (interval * 2).min(POLL_MAX_INTERVAL_SECS)
}

/// Check if the PodPreset CRD exists by attempting to discover it.
async fn check_podpreset_crd_exists(client: &Client) -> Result<bool> {
    let group = PodPreset::group(&());
    let discovery = Discovery::new(client.clone())
        .filter(&[group.as_ref()])
        .run()
        .await?;

    for api_group in discovery.groups() {
        if api_group.name() == group {
            for (ar, _) in api_group.recommended_resources() {
                if ar.kind == PodPreset::kind(&()) && ar.version == PodPreset::version(&()) {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
