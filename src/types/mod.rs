// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource types watched and referenced by the bouncer.

pub mod podpreset;

use crate::error::{BouncerError, Result};
use kube::{Resource, ResourceExt};
use std::fmt;

pub use podpreset::{PodPreset, PodPresetSpec};

/// Identity of a namespaced object, as delivered by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of a namespaced resource; fails for cluster-scoped objects.
    pub fn from_resource<K: Resource>(obj: &K) -> Result<Self> {
        let namespace = obj
            .namespace()
            .ok_or(BouncerError::MissingObjectKey(".metadata.namespace"))?;
        let name = obj
            .meta()
            .name
            .clone()
            .ok_or(BouncerError::MissingObjectKey(".metadata.name"))?;
        Ok(Self { namespace, name })
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
