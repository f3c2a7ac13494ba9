// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Pod template annotation keys written by the bouncer
pub mod annotations {
    /// Shared prefix of all PodPreset annotations
    pub const PREFIX: &str = "podpreset.admission.kubernetes.io";
    /// Bounce marker prefix; the preset name is appended
    pub const BOUNCED_PREFIX: &str = "podpreset.admission.kubernetes.io/bounced-";
}

/// Event reasons and actions recorded against presets and deployments
pub mod events {
    pub const REASON_BOUNCED: &str = "DeploymentBounced";
    pub const ACTION_BOUNCE: &str = "Bounce";
}

/// The controller name used as event reporter
pub const CONTROLLER_NAME: &str = "podpreset-controller";

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
