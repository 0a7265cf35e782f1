//! In-memory host used by the integration tests.

use async_trait::async_trait;
use chanmon::{
    ChannelHost, ChannelId, ChannelRef, ConnectionId, EventSink, EventSource, MonitorConfig,
    MonitorError, MonitoredMessage, SessionCoordinator, SessionId, SessionNotifier, SourceEvent,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Host fake implementing every chanmon host trait.
///
/// Records all calls so tests can assert on what the engine did. The
/// failure flags make the host refuse channel creation, appends, or
/// subscriptions until cleared again.
#[derive(Default)]
pub struct TestHost {
    next_channel_id: AtomicU64,
    channels: Mutex<HashMap<(ConnectionId, String), ChannelRef>>,
    topics: Mutex<HashMap<ChannelId, String>>,
    /// Appends in arrival order.
    messages: Mutex<Vec<(ConnectionId, ChannelId, MonitoredMessage)>>,
    joins: Mutex<Vec<(ConnectionId, ChannelRef)>>,
    echoes: Mutex<Vec<(SessionId, String)>>,
    sinks: Mutex<HashMap<ConnectionId, Arc<dyn EventSink>>>,
    create_calls: AtomicU64,
    subscribe_calls: AtomicU64,
    pub fail_channel_creation: AtomicBool,
    pub fail_append: AtomicBool,
    pub fail_subscribe: AtomicBool,
}

impl TestHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver an event through the subscribed sink, as the host would.
    /// Silently does nothing when no sink is subscribed.
    pub async fn emit(&self, connection: ConnectionId, event: SourceEvent) {
        let sink = self.sinks.lock().get(&connection).cloned();
        if let Some(sink) = sink {
            sink.deliver(connection, event).await;
        }
    }

    /// Drop the subscription, as a host does when a connection goes away.
    pub fn drop_subscription(&self, connection: ConnectionId) {
        self.sinks.lock().remove(&connection);
    }

    /// Pre-seed a channel, e.g. one left over from a previous process.
    pub fn seed_channel(&self, connection: ConnectionId, name: &str) -> ChannelRef {
        let id = self.next_channel_id.fetch_add(1, Ordering::Relaxed) + 1;
        let channel = ChannelRef::new(id, name);
        self.channels
            .lock()
            .insert((connection, name.to_string()), channel.clone());
        channel
    }

    pub fn channel_named(&self, connection: ConnectionId, name: &str) -> Option<ChannelRef> {
        self.channels.lock().get(&(connection, name.to_string())).cloned()
    }

    pub fn channel_count(&self, connection: ConnectionId) -> usize {
        self.channels
            .lock()
            .keys()
            .filter(|(conn, _)| *conn == connection)
            .count()
    }

    pub fn topic_of(&self, channel: ChannelId) -> Option<String> {
        self.topics.lock().get(&channel).cloned()
    }

    pub fn message_texts(&self, channel: ChannelId) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(_, id, _)| *id == channel)
            .map(|(_, _, msg)| msg.text.clone())
            .collect()
    }

    pub fn messages_in(&self, channel: ChannelId) -> Vec<MonitoredMessage> {
        self.messages
            .lock()
            .iter()
            .filter(|(_, id, _)| *id == channel)
            .map(|(_, _, msg)| msg.clone())
            .collect()
    }

    pub fn echoes_for(&self, session: SessionId) -> Vec<String> {
        self.echoes
            .lock()
            .iter()
            .filter(|(sess, _)| *sess == session)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn joins_for(&self, connection: ConnectionId) -> Vec<ChannelRef> {
        self.joins
            .lock()
            .iter()
            .filter(|(conn, _)| *conn == connection)
            .map(|(_, chan)| chan.clone())
            .collect()
    }

    pub fn is_subscribed(&self, connection: ConnectionId) -> bool {
        self.sinks.lock().contains_key(&connection)
    }

    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::Relaxed)
    }

    pub fn subscribe_calls(&self) -> u64 {
        self.subscribe_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventSource for TestHost {
    async fn subscribe(
        &self,
        connection: ConnectionId,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), MonitorError> {
        self.subscribe_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_subscribe.load(Ordering::Relaxed) {
            return Err(MonitorError::EventSourceUnavailable("connection not ready".into()));
        }
        self.sinks.lock().insert(connection, sink);
        Ok(())
    }
}

#[async_trait]
impl ChannelHost for TestHost {
    async fn find_channel(&self, connection: ConnectionId, name: &str) -> Option<ChannelRef> {
        self.channel_named(connection, name)
    }

    async fn create_channel(
        &self,
        connection: ConnectionId,
        name: &str,
        topic: &str,
    ) -> Result<ChannelRef, MonitorError> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_channel_creation.load(Ordering::Relaxed) {
            return Err(MonitorError::ChannelCreation("host refused".into()));
        }

        let mut channels = self.channels.lock();
        let key = (connection, name.to_string());
        if channels.contains_key(&key) {
            return Err(MonitorError::ChannelCreation(format!("channel {name} already exists")));
        }

        let id = self.next_channel_id.fetch_add(1, Ordering::Relaxed) + 1;
        let channel = ChannelRef::new(id, name);
        channels.insert(key, channel.clone());
        self.topics.lock().insert(id, topic.to_string());
        Ok(channel)
    }

    async fn append_message(
        &self,
        connection: ConnectionId,
        channel: &ChannelRef,
        message: MonitoredMessage,
    ) -> Result<(), MonitorError> {
        if self.fail_append.load(Ordering::Relaxed) {
            return Err(MonitorError::Append("backing store rejected the write".into()));
        }
        self.messages.lock().push((connection, channel.id, message));
        Ok(())
    }
}

#[async_trait]
impl SessionNotifier for TestHost {
    async fn channel_joined(&self, connection: ConnectionId, channel: &ChannelRef) {
        self.joins.lock().push((connection, channel.clone()));
    }

    async fn session_echo(&self, session: SessionId, text: &str) {
        self.echoes.lock().push((session, text.to_string()));
    }
}

/// Build a coordinator with the host serving all three trait roles.
pub fn coordinator(host: &Arc<TestHost>, config: MonitorConfig) -> SessionCoordinator {
    SessionCoordinator::new(config, host.clone(), host.clone(), host.clone())
}
