//! Source event model and monitor message formatting.
//!
//! A [`SourceEvent`] is one piece of channel activity as the host delivers
//! it. A [`MonitoredMessage`] is the rewritten record the engine appends to
//! the monitor channel: built once, then immutable.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Kind of channel activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Regular channel message.
    Message,
    /// Emote (CTCP ACTION, `/me`).
    Action,
    Join,
    Part,
    Quit,
    NickChange,
    ModeChange,
    TopicChange,
}

impl EventKind {
    /// Membership and state changes are never mirrored.
    #[inline]
    pub fn is_system(&self) -> bool {
        !matches!(self, EventKind::Message | EventKind::Action)
    }
}

/// One inbound activity event from a source channel.
#[derive(Debug, Clone)]
pub struct SourceEvent {
    /// Name of the channel the event originated in (e.g. `#ops`).
    pub source_channel: String,
    /// Nickname of the author.
    pub author: String,
    /// Message body. Empty for kinds that carry no text.
    pub text: String,
    /// What kind of activity this is.
    pub kind: EventKind,
}

impl SourceEvent {
    /// A regular message event.
    pub fn message(source: impl Into<String>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_channel: source.into(),
            author: author.into(),
            text: text.into(),
            kind: EventKind::Message,
        }
    }

    /// An emote event.
    pub fn action(source: impl Into<String>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_channel: source.into(),
            author: author.into(),
            text: text.into(),
            kind: EventKind::Action,
        }
    }
}

/// A rewritten record published into the monitor channel.
///
/// `from` is always the monitor channel itself and `from_self` is always
/// false: mirrored output must never read as the user's own traffic.
#[derive(Debug, Clone)]
pub struct MonitoredMessage {
    /// Unique message id.
    pub id: Uuid,
    /// Formatted text, e.g. `[#ops] <alice> hello`.
    pub text: String,
    /// Sender identity shown in the monitor channel.
    pub from: String,
    /// Creation time.
    pub time: DateTime<Utc>,
    /// Whether the message is the user's own traffic. Always false here.
    pub from_self: bool,
}

impl MonitoredMessage {
    /// Mirror a regular message: `[#ops] <alice> hello`.
    pub fn message(monitor: &str, source: &str, author: &str, text: &str) -> Self {
        Self::with_text(monitor, format!("[{source}] <{author}> {text}"))
    }

    /// Mirror an emote: `[#ops] * alice waves`.
    pub fn action(monitor: &str, source: &str, author: &str, text: &str) -> Self {
        Self::with_text(monitor, format!("[{source}] * {author} {text}"))
    }

    /// A manually added line: `[#ops] <manual> deploy done`.
    ///
    /// `origin` is the channel the command was typed in.
    pub fn manual(monitor: &str, origin: &str, text: &str) -> Self {
        Self::with_text(monitor, format!("[{origin}] <manual> {text}"))
    }

    /// An unprefixed announcement, such as the welcome line.
    pub fn announcement(monitor: &str, text: impl Into<String>) -> Self {
        Self::with_text(monitor, text.into())
    }

    fn with_text(monitor: &str, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            from: monitor.to_string(),
            time: Utc::now(),
            from_self: false,
        }
    }
}
