// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Notification sink for bounce events

use crate::constants::events::ACTION_BOUNCE;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

/// An informational message attached to an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub reason: String,
    pub message: String,
}

impl Notification {
    pub fn normal(reason: &str, message: impl Into<String>) -> Self {
        Self {
            reason: reason.to_string(),
            message: message.into(),
        }
    }
}

/// Fire-and-forget notification sink. Delivery failures never reach the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &ObjectReference, notification: Notification);
}

/// [`Notifier`] publishing Kubernetes Events
pub struct KubeNotifier {
    recorder: Recorder,
}

impl KubeNotifier {
    pub fn new(client: Client, controller: &str, instance: Option<String>) -> Self {
        let reporter = Reporter {
            controller: controller.to_string(),
            instance,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl Notifier for KubeNotifier {
    async fn notify(&self, subject: &ObjectReference, notification: Notification) {
        let event = Event {
            type_: EventType::Normal,
            reason: notification.reason,
            note: Some(notification.message),
            action: ACTION_BOUNCE.to_string(),
            secondary: None,
        };

        if let Err(e) = self.recorder.publish(&event, subject).await {
            warn!(
                "Failed to publish event for {}/{}: {}",
                subject.namespace.as_deref().unwrap_or_default(),
                subject.name.as_deref().unwrap_or_default(),
                e
            );
        }
    }
}
