//! Wire protocol: CRLF-terminated text frames.
//!
//! The session only speaks four outbound frame kinds (nickname
//! registration, user registration, channel join, keep-alive reply) and
//! cares about two inbound kinds (liveness pings and channel messages).
//! Everything else is expected noise and parses to `None`.

pub mod transport;

/// Chat server hostname.
pub const CHAT_HOST: &str = "irc.chat.twitch.tv";

/// Encrypted port the chat server listens on.
pub const CHAT_PORT: u16 = 443;

/// Exact reply required for a liveness ping.
pub const PONG_FRAME: &str = "PONG :tmi.twitch.tv\r\n";

/// Inbound frames the session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Liveness ping; must be answered promptly with [`PONG_FRAME`].
    Ping,
    /// A channel chat message.
    Message { username: String, text: String },
}

/// An anonymous nickname derived from the current time, to avoid
/// collisions between concurrently connected sessions.
pub fn anonymous_nick() -> String {
    format!(
        "justinfan{}",
        time::OffsetDateTime::now_utc().unix_timestamp()
    )
}

/// Lowercase a channel name and ensure the `#` prefix.
pub fn normalize_channel(name: &str) -> String {
    let name = name.trim().trim_start_matches('#').to_lowercase();
    format!("#{name}")
}

/// The three registration frames sent after the transport handshake:
/// nickname, user registration, channel join. The connection is always
/// anonymous; no credential frame exists.
pub fn registration_frames(nick: &str, channel: &str) -> [String; 3] {
    [
        format!("NICK {nick}\r\n"),
        format!("USER {nick} 8 * :{nick}\r\n"),
        format!("JOIN {channel}\r\n"),
    ]
}

/// Parse one inbound frame.
///
/// Returns `None` for every frame kind the session does not track;
/// unrecognized frames are not an error.
pub fn parse_frame(line: &str) -> Option<InboundFrame> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.starts_with("PING") {
        return Some(InboundFrame::Ping);
    }

    // :<user>!<user>@<host> PRIVMSG #<channel> :<text>
    let rest = line.strip_prefix(':')?;
    let (prefix, remainder) = rest.split_once(' ')?;
    let (username, _host) = prefix.split_once('!')?;
    let remainder = remainder.strip_prefix("PRIVMSG ")?;
    let (target, text) = remainder.split_once(" :")?;
    if !target.starts_with('#') {
        return None;
    }

    Some(InboundFrame::Message {
        username: username.to_string(),
        text: text.to_string(),
    })
}
