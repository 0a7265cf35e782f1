//! Per-connection monitor state and channel bookkeeping.
//!
//! The registry is a side-table keyed by connection identity. State entries
//! are created lazily on first touch and survive disconnects; the channel
//! handle and listener attachment inside them are transient and rebuilt on
//! reconnect.

use crate::config::MonitorConfig;
use crate::dedup::DedupWindow;
use crate::error::MonitorError;
use crate::event::MonitoredMessage;
use crate::host::{ChannelHost, ChannelRef, ConnectionId, SessionNotifier};
use crate::metrics;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Listener attachment progress for one connection.
///
/// `NotAttached -> Attached` happens at most once per connected period. The
/// transition is guarded by the binding lock, so concurrent toggles cannot
/// double-subscribe; a failed attach leaves the state `NotAttached` and a
/// later invocation retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachState {
    #[default]
    NotAttached,
    Attached,
}

/// Channel handle and attachment progress, guarded as a unit.
#[derive(Debug, Default)]
pub struct Binding {
    /// The monitor channel, once resolved or created.
    pub channel: Option<ChannelRef>,
    /// Whether the engine is subscribed to the connection's event stream.
    pub attach: AttachState,
}

/// Monitor state for one connection.
///
/// Lives for the whole connection lifetime. Disconnect resets the binding
/// and the dedup window but leaves `enabled` alone, so monitoring resumes
/// in the same mode after a reconnect.
#[derive(Debug)]
pub struct MonitorState {
    enabled: AtomicBool,
    /// Serializes channel creation and listener attachment per connection.
    /// Held across host calls, hence a tokio mutex.
    pub(crate) binding: Mutex<Binding>,
    pub(crate) window: DedupWindow,
}

impl MonitorState {
    fn new(start_enabled: bool, window_ttl: Duration) -> Self {
        Self {
            enabled: AtomicBool::new(start_enabled),
            binding: Mutex::new(Binding::default()),
            window: DedupWindow::new(window_ttl),
        }
    }

    /// Whether monitoring is currently on for this connection.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flip the monitoring flag, returning the new value.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }
}

/// Side-table of monitor states plus the channel bookkeeping built on it.
pub struct MonitorRegistry {
    config: MonitorConfig,
    states: DashMap<ConnectionId, Arc<MonitorState>>,
    channels: Arc<dyn ChannelHost>,
    notifier: Arc<dyn SessionNotifier>,
}

impl MonitorRegistry {
    pub fn new(
        config: MonitorConfig,
        channels: Arc<dyn ChannelHost>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Self {
        Self {
            config,
            states: DashMap::new(),
            channels,
            notifier,
        }
    }

    /// Name of the reserved monitor channel.
    pub fn channel_name(&self) -> &str {
        &self.config.channel_name
    }

    /// Fetch the connection's state, creating it on first touch.
    ///
    /// The entry API makes racing first touches converge on one entry.
    pub fn state(&self, connection: ConnectionId) -> Arc<MonitorState> {
        self.states
            .entry(connection)
            .or_insert_with(|| {
                debug!(connection = %connection, "monitor state created");
                Arc::new(MonitorState::new(self.config.start_enabled, self.config.dedup_window()))
            })
            .clone()
    }

    /// Look up the connection's state without creating it.
    pub fn get(&self, connection: ConnectionId) -> Option<Arc<MonitorState>> {
        self.states.get(&connection).map(|entry| entry.clone())
    }

    /// Drop all state for a connection.
    pub fn remove(&self, connection: ConnectionId) {
        self.states.remove(&connection);
    }

    /// Number of connections with monitor state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Resolve the monitor channel for `connection`, creating it on first
    /// use.
    ///
    /// Returns the handle and whether this call created the channel.
    /// Exactly one channel ever exists per connection: the binding lock
    /// serializes racing callers, and a channel already present on the host
    /// (left over from a previous process) is adopted as-is, without a
    /// second welcome.
    ///
    /// On [`MonitorError::ChannelCreation`] nothing is recorded; the caller
    /// reports the failure and aborts whatever it was doing.
    pub async fn get_or_create_channel(
        &self,
        connection: ConnectionId,
        state: &MonitorState,
    ) -> Result<(ChannelRef, bool), MonitorError> {
        let mut binding = state.binding.lock().await;
        if let Some(channel) = &binding.channel {
            return Ok((channel.clone(), false));
        }

        // Re-detect before creating; the channel may predate this process.
        if let Some(existing) = self
            .channels
            .find_channel(connection, &self.config.channel_name)
            .await
        {
            debug!(connection = %connection, channel = %existing.name, "adopted existing monitor channel");
            binding.channel = Some(existing.clone());
            return Ok((existing, false));
        }

        let created = self
            .channels
            .create_channel(connection, &self.config.channel_name, &self.config.channel_topic)
            .await?;

        let welcome = MonitoredMessage::announcement(&created.name, welcome_text(state.is_enabled()));
        if let Err(e) = self.channels.append_message(connection, &created, welcome).await {
            // The channel itself is fine; only the greeting was lost.
            warn!(connection = %connection, error = %e, "welcome message append failed");
        }
        self.notifier.channel_joined(connection, &created).await;

        info!(connection = %connection, channel = %created.name, "monitor channel created");
        metrics::record_channel_created();

        binding.channel = Some(created.clone());
        Ok((created, true))
    }
}

/// Welcome line appended once when the channel is first created.
fn welcome_text(enabled: bool) -> String {
    format!(
        "Welcome to Channel Monitor! Automatic monitoring is {}. Messages from other channels will appear here automatically.",
        if enabled { "ENABLED" } else { "DISABLED" }
    )
}
