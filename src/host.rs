//! Host integration boundary.
//!
//! The engine is embedded into a host (an IRC daemon, bouncer, or web
//! client backend) that owns connections, channels, and client sessions.
//! The host implements [`EventSource`], [`ChannelHost`], and
//! [`SessionNotifier`]; the engine implements [`EventSink`] and is handed to
//! the host through [`EventSource::subscribe`].

use crate::error::MonitorError;
use crate::event::{MonitoredMessage, SourceEvent};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity of one network connection.
///
/// A connection outlives the client sessions attached to it; monitor state
/// is keyed by this identity.
pub type ConnectionId = Uuid;

/// Stable identity of one attached client session.
pub type SessionId = Uuid;

/// Host-assigned channel identity.
pub type ChannelId = u64;

/// Handle to a host-owned channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

impl ChannelRef {
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// Inbound event callback, implemented by the engine.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one activity event from a source channel.
    ///
    /// The host awaits each delivery before the next for the same
    /// connection; deliveries for different connections may interleave.
    async fn deliver(&self, connection: ConnectionId, event: SourceEvent);
}

/// Per-connection event stream exposed by the host.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Register `sink` to receive message and action events for
    /// `connection`.
    ///
    /// Fails with [`MonitorError::EventSourceUnavailable`] when the
    /// connection is not ready to deliver events; the caller may retry
    /// later.
    async fn subscribe(
        &self,
        connection: ConnectionId,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), MonitorError>;
}

/// Channel operations the host performs on the engine's behalf.
#[async_trait]
pub trait ChannelHost: Send + Sync {
    /// Look up an existing channel by name.
    async fn find_channel(&self, connection: ConnectionId, name: &str) -> Option<ChannelRef>;

    /// Create a channel with the given topic.
    async fn create_channel(
        &self,
        connection: ConnectionId,
        name: &str,
        topic: &str,
    ) -> Result<ChannelRef, MonitorError>;

    /// Append a message to a channel.
    ///
    /// Appending is the single notification path: the host delivers the
    /// new-message notification to attached clients as part of the append.
    /// Callers must never notify separately, or clients see the message
    /// twice.
    async fn append_message(
        &self,
        connection: ConnectionId,
        channel: &ChannelRef,
        message: MonitoredMessage,
    ) -> Result<(), MonitorError>;
}

/// Session-facing notifications.
///
/// Both calls are fire-and-forget from the engine's perspective; delivery
/// failures are the host's to log.
#[async_trait]
pub trait SessionNotifier: Send + Sync {
    /// Tell the connection's sessions that a channel appeared and was
    /// joined.
    async fn channel_joined(&self, connection: ConnectionId, channel: &ChannelRef);

    /// Send a private feedback line to one session. Never broadcast.
    async fn session_echo(&self, session: SessionId, text: &str);
}
