//! Notification publisher interface.
//!
//! The chat session only knows it can publish an event with a text payload
//! and a small set of tags; the concrete bus lives behind this trait. An
//! in-memory implementation ships here so the whole pipeline is testable
//! without any network or bus dependency.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;

/// Source-service tag carried by every notification.
pub const SERVICE_NAME: &str = "chat";

/// How urgently downstream consumers should treat a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Requires prompt downstream attention (rendered instruction or
    /// immediate-reaction prompt).
    Priority,
    /// Informational; carries the raw chat line for logging/monitoring.
    Background,
}

/// One outbound event. Not retained after hand-off to the publisher.
#[derive(Debug, Clone)]
pub struct OutboundNotification {
    pub kind: NotificationKind,
    pub service: &'static str,
    pub username: String,
    pub text: String,
}

impl OutboundNotification {
    /// A priority notification.
    pub fn priority(username: String, text: String) -> Self {
        Self {
            kind: NotificationKind::Priority,
            service: SERVICE_NAME,
            username,
            text,
        }
    }

    /// A background notification.
    pub fn background(username: String, text: String) -> Self {
        Self {
            kind: NotificationKind::Background,
            service: SERVICE_NAME,
            username,
            text,
        }
    }
}

/// Errors surfaced by a concrete publisher.
///
/// The session never propagates these; it logs and moves on.
#[derive(Debug, Error)]
#[error("failed to publish notification: {0}")]
pub struct PublishError(pub String);

/// Downstream notification boundary.
///
/// Calls from a single session are always sequential; implementations
/// shared across threads must provide their own synchronization.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Emit one notification.
    async fn publish(&self, notification: OutboundNotification) -> Result<(), PublishError>;

    /// Release any resources. Idempotent, and safe to call even if
    /// `publish` was never called.
    async fn close(&self);
}

/// In-memory publisher for tests and embedding.
#[derive(Default)]
pub struct MemoryPublisher {
    published: Mutex<Vec<OutboundNotification>>,
    closed: AtomicBool,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far, in publish order.
    pub async fn published(&self) -> Vec<OutboundNotification> {
        self.published.lock().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationPublisher for MemoryPublisher {
    async fn publish(&self, notification: OutboundNotification) -> Result<(), PublishError> {
        self.published.lock().await.push(notification);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
