// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::selector::SelectorError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BouncerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Update of {0} rejected: object was modified concurrently")]
    Conflict(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(#[from] SelectorError),

    #[error("Missing object key: {0}")]
    MissingObjectKey(&'static str),

    #[error("Reconciliation cancelled")]
    Cancelled,

    #[error("Reconciliation timed out after {0:?}")]
    Timeout(Duration),
}

impl BouncerError {
    /// How long the dispatcher should wait before retrying.
    ///
    /// Every error is retryable. A write conflict is resolved by re-reading
    /// current state, so it retries immediately; everything else backs off.
    pub fn retry_after(&self, backoff: Duration) -> Duration {
        match self {
            BouncerError::Conflict(_) => Duration::ZERO,
            _ => backoff,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, BouncerError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, BouncerError>;
