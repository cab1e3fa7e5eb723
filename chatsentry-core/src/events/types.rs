//! Event type definitions for the session pipeline.
//!
//! All events are ephemeral: a [`ChatLine`] is consumed by the per-line
//! pipeline immediately and never retained.

use time::OffsetDateTime;

/// One parsed chat message.
#[derive(Debug, Clone)]
pub struct ChatLine {
    /// Author of the message.
    pub username: String,
    /// Message text, CRLF stripped.
    pub text: String,
    /// When the protocol reader parsed the frame.
    pub received_at: OffsetDateTime,
}

impl ChatLine {
    /// Create a line stamped with the current time.
    pub fn new(username: String, text: String) -> Self {
        Self {
            username,
            text,
            received_at: OffsetDateTime::now_utc(),
        }
    }
}

/// What the protocol reader hands to the consumer loop.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A parsed chat-message frame.
    Line(ChatLine),
    /// The transport is gone (EOF, I/O error, or stop); no further lines
    /// will arrive.
    Closed,
}
