//! Channel factories and handles for session events.

use super::types::SessionEvent;
use tokio::sync::mpsc;

/// Default buffer size for the session event channel.
///
/// Chat throughput is low relative to processing cost; this is headroom
/// for bursts, not a throughput knob.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for session events.
pub type SessionEventSender = mpsc::Sender<SessionEvent>;
/// Receiver handle for session events.
pub type SessionEventReceiver = mpsc::Receiver<SessionEvent>;

/// Create a new session event channel.
///
/// Exactly one reader/consumer pair per chat session; FIFO order is what
/// guarantees notifications are published in receive order.
pub fn session_event_channel() -> (SessionEventSender, SessionEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
