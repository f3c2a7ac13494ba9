// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes adapters: object store, event notifications and CRD discovery.

pub mod crd;
pub mod events;
pub mod store;

pub use crd::wait_for_podpreset_crd;
pub use events::{KubeNotifier, Notification, Notifier};
pub use store::{KubeStore, ObjectStore};
