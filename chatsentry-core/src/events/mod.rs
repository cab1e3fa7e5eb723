//! Event plumbing between the protocol reader and the line pipeline.
//!
//! The reader task parses inbound frames and pushes [`SessionEvent`]s onto
//! a bounded channel; the consumer drains it with a blocking receive. This
//! replaces any shared queue/flag polling: termination is an in-band
//! marker, cancellation is a watch signal.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, SessionEventReceiver, SessionEventSender, session_event_channel,
};
pub use types::{ChatLine, SessionEvent};
