//! Stdout notification publisher.
//!
//! The supervising process consumes notifications as a line protocol on
//! this process's stdout, one notification per line:
//!
//! ```text
//! CHAT - <user>: <text>      background
//! INSTRUCTION: <text>        priority
//! ```

use async_trait::async_trait;
use chatsentry_core::publish::{
    NotificationKind, NotificationPublisher, OutboundNotification, PublishError,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct StdoutPublisher {
    closed: AtomicBool,
}

impl StdoutPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Render one notification as its wire line, without the trailing newline.
fn format_line(notification: &OutboundNotification) -> String {
    match notification.kind {
        NotificationKind::Background => {
            format!("CHAT - {}: {}", notification.username, notification.text)
        }
        NotificationKind::Priority => format!("INSTRUCTION: {}", notification.text),
    }
}

#[async_trait]
impl NotificationPublisher for StdoutPublisher {
    async fn publish(&self, notification: OutboundNotification) -> Result<(), PublishError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PublishError("publisher is closed".to_string()));
        }

        let line = format_line(&notification);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")
            .and_then(|()| stdout.flush())
            .map_err(|e| PublishError(e.to_string()))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_lines_carry_the_username() {
        let line = format_line(&OutboundNotification::background(
            "alice".to_string(),
            "hello chat".to_string(),
        ));
        assert_eq!(line, "CHAT - alice: hello chat");
    }

    #[test]
    fn priority_lines_carry_only_the_text() {
        let line = format_line(&OutboundNotification::priority(
            "streambot".to_string(),
            "Celebrate alice's subscription and give them a warm welcome.".to_string(),
        ));
        assert_eq!(
            line,
            "INSTRUCTION: Celebrate alice's subscription and give them a warm welcome."
        );
    }

    #[tokio::test]
    async fn publish_after_close_fails() {
        let publisher = StdoutPublisher::new();
        publisher.close().await;
        publisher.close().await;

        let result = publisher
            .publish(OutboundNotification::background(
                "alice".to_string(),
                "late".to_string(),
            ))
            .await;
        assert!(result.is_err());
    }
}
