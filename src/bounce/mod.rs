// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Rolling restarts of deployments governed by a PodPreset.

pub mod marker;
pub mod reconcile;

pub use reconcile::{reconcile, Context, Outcome};
