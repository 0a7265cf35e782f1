//! Event intake and fan-in to the monitor channel.

use crate::event::SourceEvent;
use crate::filter::{self, Verdict};
use crate::host::{ChannelHost, ConnectionId, EventSink};
use crate::metrics;
use crate::registry::MonitorRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Receives source events and mirrors admitted ones into the monitor
/// channel.
///
/// One engine serves every connection; per-connection state lives in the
/// registry. Drops are silent at default log levels so a busy network does
/// not flood the host's logs.
pub struct AggregationEngine {
    registry: Arc<MonitorRegistry>,
    channels: Arc<dyn ChannelHost>,
}

impl AggregationEngine {
    pub fn new(registry: Arc<MonitorRegistry>, channels: Arc<dyn ChannelHost>) -> Self {
        Self { registry, channels }
    }

    /// Run one event through the filter and, on admission, append the
    /// rewritten message.
    ///
    /// Touching the registry creates the connection's state on first event,
    /// so monitoring works even when no session has connected or toggled
    /// yet (it simply starts in the configured default mode).
    pub async fn on_event(&self, connection: ConnectionId, event: SourceEvent) {
        let state = self.registry.state(connection);

        let verdict = filter::evaluate(
            &event,
            state.is_enabled(),
            self.registry.channel_name(),
            &state.window,
        );

        let message = match verdict {
            Verdict::Dropped(reason) => {
                trace!(
                    connection = %connection,
                    source = %event.source_channel,
                    reason = reason.code(),
                    "event dropped"
                );
                metrics::record_event_dropped(reason.code());
                return;
            }
            Verdict::Admitted(message) => message,
        };

        let channel = match self.registry.get_or_create_channel(connection, &state).await {
            Ok((channel, _created)) => channel,
            Err(e) => {
                warn!(connection = %connection, error = %e, "monitor channel unavailable, event dropped");
                metrics::record_event_dropped(e.error_code());
                return;
            }
        };

        debug!(
            connection = %connection,
            source = %event.source_channel,
            author = %event.author,
            "event admitted"
        );

        // The append is the single notification path; the host tells
        // attached clients about the new message as part of it.
        match self.channels.append_message(connection, &channel, message).await {
            Ok(()) => metrics::record_event_admitted(),
            Err(e) => {
                warn!(connection = %connection, error = %e, "append to monitor channel failed");
                metrics::record_event_dropped(e.error_code());
            }
        }
    }
}

#[async_trait]
impl EventSink for AggregationEngine {
    async fn deliver(&self, connection: ConnectionId, event: SourceEvent) {
        self.on_event(connection, event).await;
    }
}
