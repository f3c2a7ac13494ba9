// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;
const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace to watch for PodPresets, all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Delay before retrying a failed reconciliation
    pub error_requeue_secs: u64,
    /// Upper bound on a single reconciliation
    pub reconcile_timeout_secs: u64,
    /// Reporter instance attached to emitted events
    pub pod_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            error_requeue_secs: DEFAULT_ERROR_REQUEUE_SECS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            pod_name: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let error_requeue_secs = non_empty("ERROR_REQUEUE_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("ERROR_REQUEUE_SECS must be a number of seconds")?
            .unwrap_or(DEFAULT_ERROR_REQUEUE_SECS);

        let reconcile_timeout_secs = non_empty("RECONCILE_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("RECONCILE_TIMEOUT_SECS must be a number of seconds")?
            .unwrap_or(DEFAULT_RECONCILE_TIMEOUT_SECS);

        Ok(Config {
            watch_namespace: non_empty("WATCH_NAMESPACE"),
            error_requeue_secs,
            reconcile_timeout_secs,
            pod_name: non_empty("POD_NAME"),
        })
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }
}
