//! Chat session.
//!
//! Owns the persistent connection, drives the keep-alive protocol, and
//! runs the per-line pipeline: immediate-reaction check, background or
//! priority publish, then classify → render → priority publish for
//! source-account lines. One in-flight line at a time; published
//! notifications keep receive order.
//!
//! The session never auto-reconnects: on I/O failure or stop signal it
//! transitions to `Disconnected` and returns. Supervision is external.

use crate::config::ChatConfig;
use crate::detect::{CompiledMatcher, classify, compile_config, render};
use crate::events::{ChatLine, SessionEvent, SessionEventSender, session_event_channel};
use crate::irc::{self, InboundFrame, transport::TransportError};
use crate::publish::{NotificationPublisher, OutboundNotification};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

/// Connection lifecycle. `Disconnected` is terminal, reached by clean
/// shutdown or unrecoverable I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Joining,
    Listening,
    Closing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Joining => "joining",
            SessionState::Listening => "listening",
            SessionState::Closing => "closing",
        };
        write!(f, "{s}")
    }
}

/// Errors that end a session before or during the listen loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single chat session over one connection.
pub struct ChatSession {
    config: ChatConfig,
    channel: String,
    matchers: Vec<CompiledMatcher>,
    publisher: Arc<dyn NotificationPublisher>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ChatSession {
    /// Build a session from a loaded configuration.
    ///
    /// Matchers are compiled here, once; a configuration change requires a
    /// new session.
    pub fn new(
        config: ChatConfig,
        publisher: Arc<dyn NotificationPublisher>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let matchers = compile_config(&config);
        let channel = irc::normalize_channel(&config.channel);
        info!(
            channel = %channel,
            source_account = %config.bot_name,
            matchers = matchers.len(),
            "chat session prepared"
        );
        Self {
            config,
            channel,
            matchers,
            publisher,
            shutdown_rx,
        }
    }

    /// Connect to the chat server and run until EOF, I/O error, or stop
    /// signal.
    pub async fn run(self) -> Result<(), SessionError> {
        info!(
            state = %SessionState::Connecting,
            host = irc::CHAT_HOST,
            port = irc::CHAT_PORT,
            "opening chat connection"
        );
        let stream = irc::transport::connect(irc::CHAT_HOST, irc::CHAT_PORT).await?;
        self.run_with_stream(stream).await
    }

    /// Run the session over an already-established stream.
    ///
    /// Split out from [`run`](Self::run) so the whole pipeline can be
    /// exercised over an in-memory stream.
    pub async fn run_with_stream<S>(self, stream: S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);

        // Joining: nickname, user registration, channel join. The protocol
        // needs no acknowledgment before listening; joining a nonexistent
        // channel just never yields messages.
        let nick = irc::anonymous_nick();
        info!(state = %SessionState::Joining, nick = %nick, channel = %self.channel, "registering");
        for frame in irc::registration_frames(&nick, &self.channel) {
            write_half.write_all(frame.as_bytes()).await?;
        }
        write_half.flush().await?;
        info!(state = %SessionState::Listening, "connected to chat");

        let (tx, mut rx) = session_event_channel();
        let reader = tokio::spawn(read_loop(
            read_half,
            write_half,
            tx,
            self.shutdown_rx.clone(),
        ));

        let mut shutdown_rx = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!(state = %SessionState::Closing, "stop signal received");
                        break;
                    }
                }

                event = rx.recv() => match event {
                    Some(SessionEvent::Line(line)) => self.process_line(line).await,
                    Some(SessionEvent::Closed) | None => {
                        info!("chat stream closed");
                        break;
                    }
                }
            }
        }

        let _ = reader.await;
        info!(state = %SessionState::Disconnected, "session ended");
        Ok(())
    }

    /// Per-line pipeline. Every stage converts its own failure into a log
    /// line and a skip; nothing propagates out of the session.
    async fn process_line(&self, line: ChatLine) {
        debug!(username = %line.username, text = %line.text, "chat line");

        // Immediate-reaction check: plain substring, any author.
        let triggered = self
            .config
            .immediate_reaction
            .as_deref()
            .is_some_and(|t| !t.is_empty() && line.text.contains(t));
        if triggered {
            let prompt = format!("Reply to this message from {}: {}", line.username, line.text);
            self.publish(OutboundNotification::priority(line.username.clone(), prompt))
                .await;
        } else {
            self.publish(OutboundNotification::background(
                line.username.clone(),
                line.text.clone(),
            ))
            .await;
        }

        // Event classification: source-account lines only, independent of
        // the immediate-reaction branch above.
        let Some(result) = classify(&line, &self.config.bot_name, &self.matchers) else {
            return;
        };
        let Some(instruction) = self.config.instruction(&result.event_key) else {
            warn!(event = %result.event_key, "matched event has no instruction template");
            return;
        };
        match render(instruction, &result.variables, &self.config.channel) {
            Ok(text) => {
                info!(event = %result.event_key, username = %line.username, "event detected");
                self.publish(OutboundNotification::priority(line.username.clone(), text))
                    .await;
            }
            Err(e) => {
                warn!(
                    event = %result.event_key,
                    error = %e,
                    "failed to render instruction; notification dropped"
                );
            }
        }
    }

    async fn publish(&self, notification: OutboundNotification) {
        if let Err(e) = self.publisher.publish(notification).await {
            warn!(error = %e, "failed to publish notification");
        }
    }
}

/// Protocol read loop.
///
/// Answers liveness pings inline, before the next read, and forwards
/// parsed chat messages to the consumer. Sends the termination marker on
/// EOF or read failure; exits silently on stop signal (the consumer has
/// its own).
async fn read_loop<R, W>(
    read_half: R,
    mut write_half: W,
    tx: SessionEventSender,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    let mut lines = BufReader::new(read_half).lines();
    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }

            result = lines.next_line() => match result {
                Ok(Some(line)) => match irc::parse_frame(&line) {
                    Some(InboundFrame::Ping) => {
                        if let Err(e) = write_pong(&mut write_half).await {
                            error!(error = %e, "failed to answer liveness ping");
                            let _ = tx.send(SessionEvent::Closed).await;
                            break;
                        }
                    }
                    Some(InboundFrame::Message { username, text }) => {
                        if tx
                            .send(SessionEvent::Line(ChatLine::new(username, text)))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    None => trace!(frame = %line, "ignoring unrecognized frame"),
                },
                Ok(None) => {
                    let _ = tx.send(SessionEvent::Closed).await;
                    break;
                }
                Err(e) => {
                    error!(error = %e, "chat read failed");
                    let _ = tx.send(SessionEvent::Closed).await;
                    break;
                }
            }
        }
    }
}

async fn write_pong<W: AsyncWrite + Unpin>(write_half: &mut W) -> std::io::Result<()> {
    write_half.write_all(irc::PONG_FRAME.as_bytes()).await?;
    write_half.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventDefaults;
    use crate::publish::{MemoryPublisher, NotificationKind};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::time::timeout;

    fn test_config(immediate_reaction: Option<&str>) -> ChatConfig {
        let mut config = EventDefaults::canonical().to_config();
        config.channel = "somechannel".to_string();
        config.bot_name = "somebot".to_string();
        config.immediate_reaction = immediate_reaction.map(str::to_string);
        config
    }

    fn privmsg(user: &str, text: &str) -> String {
        format!(":{user}!{user}@{user}.tmi.twitch.tv PRIVMSG #somechannel :{text}\r\n")
    }

    /// Runs a session against an in-memory peer. Returns everything the
    /// session wrote plus the publisher for inspection.
    async fn drive_session(
        config: ChatConfig,
        inbound: &[String],
    ) -> (String, Arc<MemoryPublisher>) {
        let publisher = Arc::new(MemoryPublisher::new());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let session = ChatSession::new(config, publisher.clone(), shutdown_rx);

        let (session_side, mut peer_side) = tokio::io::duplex(4096);
        let handle = tokio::spawn(session.run_with_stream(session_side));

        for frame in inbound {
            tokio::io::AsyncWriteExt::write_all(&mut peer_side, frame.as_bytes())
                .await
                .unwrap();
        }
        tokio::io::AsyncWriteExt::shutdown(&mut peer_side).await.unwrap();

        let mut written = String::new();
        peer_side.read_to_string(&mut written).await.unwrap();

        timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        (written, publisher)
    }

    #[tokio::test]
    async fn registration_frames_are_sent_on_start() {
        let (written, _) = drive_session(test_config(None), &[]).await;
        let lines: Vec<&str> = written.split("\r\n").collect();
        assert!(lines[0].starts_with("NICK justinfan"));
        assert!(lines[1].starts_with("USER justinfan"));
        assert_eq!(lines[2], "JOIN #somechannel");
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let (written, _) = drive_session(
            test_config(None),
            &["PING :tmi.twitch.tv\r\n".to_string()],
        )
        .await;
        assert!(written.contains("PONG :tmi.twitch.tv\r\n"));
    }

    #[tokio::test]
    async fn source_account_event_line_yields_background_and_instruction() {
        let (_, publisher) = drive_session(
            test_config(None),
            &[privmsg("somebot", "alice just followed!")],
        )
        .await;

        let published = publisher.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].kind, NotificationKind::Background);
        assert_eq!(published[0].text, "alice just followed!");
        assert_eq!(published[1].kind, NotificationKind::Priority);
        assert_eq!(
            published[1].text,
            "Show appreciation by greeting alice and thanking them for the follow."
        );
    }

    #[tokio::test]
    async fn non_source_line_matching_a_pattern_stays_background() {
        let (_, publisher) = drive_session(
            test_config(None),
            &[privmsg("viewer42", "alice just followed!")],
        )
        .await;

        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].kind, NotificationKind::Background);
        assert_eq!(published[0].username, "viewer42");
    }

    #[tokio::test]
    async fn trigger_substring_fires_for_any_user() {
        let (_, publisher) = drive_session(
            test_config(Some("!help")),
            &[privmsg("viewer42", "can someone !help me out")],
        )
        .await;

        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].kind, NotificationKind::Priority);
        assert!(published[0].text.starts_with("Reply to this message from viewer42:"));
    }

    #[tokio::test]
    async fn trigger_and_event_fire_independently_on_one_line() {
        let mut config = test_config(Some("followed"));
        config
            .instructions
            .insert("follow".to_string(), "Thank {user} for following!".to_string());

        let (_, publisher) = drive_session(config, &[privmsg("somebot", "alice just followed!")])
            .await;

        let published = publisher.published().await;
        assert_eq!(published.len(), 2);
        // Immediate-reaction priority replaces the background notification...
        assert_eq!(published[0].kind, NotificationKind::Priority);
        assert!(published[0].text.contains("alice just followed!"));
        // ...and template matching still fires its own priority.
        assert_eq!(published[1].kind, NotificationKind::Priority);
        assert_eq!(published[1].text, "Thank alice for following!");
    }

    #[tokio::test]
    async fn unresolvable_instruction_drops_only_that_notification() {
        let mut config = test_config(None);
        config
            .instructions
            .insert("follow".to_string(), "Thank {user} for {reward}!".to_string());

        let (_, publisher) = drive_session(config, &[privmsg("somebot", "alice just followed!")])
            .await;

        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].kind, NotificationKind::Background);
    }

    #[tokio::test]
    async fn notifications_keep_receive_order() {
        let (_, publisher) = drive_session(
            test_config(None),
            &[
                privmsg("a", "first"),
                privmsg("b", "second"),
                privmsg("c", "third"),
            ],
        )
        .await;

        let texts: Vec<String> = publisher
            .published()
            .await
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn stop_signal_ends_an_idle_session() {
        let publisher = Arc::new(MemoryPublisher::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let session = ChatSession::new(test_config(None), publisher, shutdown_rx);

        let (session_side, _peer_side) = tokio::io::duplex(4096);
        let handle = tokio::spawn(session.run_with_stream(session_side));

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
