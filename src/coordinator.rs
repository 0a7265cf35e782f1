//! Connection lifecycle binding and the `chanmon` command.
//!
//! The coordinator is what the host talks to: it wires connections to the
//! aggregation engine on connect, tears the wiring down on disconnect, and
//! implements the toggle command. Failures never cross this boundary as
//! errors; they surface as private echo lines to the invoking session.

use crate::config::MonitorConfig;
use crate::engine::AggregationEngine;
use crate::error::MonitorError;
use crate::event::MonitoredMessage;
use crate::host::{ChannelHost, ConnectionId, EventSource, SessionId, SessionNotifier};
use crate::metrics;
use crate::registry::{AttachState, MonitorRegistry, MonitorState};
use crate::telemetry::{CommandTimer, spans};
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

/// Name under which the host registers the toggle command.
pub const COMMAND_NAME: &str = "chanmon";

/// Identities of one command invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The session that typed the command.
    pub session: SessionId,
    /// The connection the session is attached to.
    pub connection: ConnectionId,
    /// Name of the channel the command was typed in; used as the origin tag
    /// for manual additions.
    pub origin_channel: String,
}

/// Host-facing surface of the monitor.
///
/// One coordinator serves all connections. Constructing it builds the
/// registry and the engine; the host keeps the coordinator alive for its
/// own lifetime and calls the `handle_*` entry points from its connection
/// lifecycle and command dispatch.
pub struct SessionCoordinator {
    registry: Arc<MonitorRegistry>,
    engine: Arc<AggregationEngine>,
    events: Arc<dyn EventSource>,
    channels: Arc<dyn ChannelHost>,
    notifier: Arc<dyn SessionNotifier>,
}

impl SessionCoordinator {
    pub fn new(
        config: MonitorConfig,
        events: Arc<dyn EventSource>,
        channels: Arc<dyn ChannelHost>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Self {
        let registry = Arc::new(MonitorRegistry::new(config, channels.clone(), notifier.clone()));
        let engine = Arc::new(AggregationEngine::new(registry.clone(), channels.clone()));
        Self {
            registry,
            engine,
            events,
            channels,
            notifier,
        }
    }

    /// The engine as an event sink, for hosts that wire subscriptions
    /// themselves instead of exposing an [`EventSource`].
    pub fn sink(&self) -> Arc<AggregationEngine> {
        self.engine.clone()
    }

    /// Whether monitoring is enabled for `connection`.
    ///
    /// Touching a connection for the first time creates its state in the
    /// configured default mode.
    pub fn is_enabled(&self, connection: ConnectionId) -> bool {
        self.registry.state(connection).is_enabled()
    }

    /// Prepare monitoring for a newly connected session.
    ///
    /// Ensures the monitor channel exists (creating it on the connection's
    /// first ever connect, adopting it on later ones) and attaches the
    /// engine to the connection's event stream. The enabled flag is not
    /// touched. A creation failure is reported to the session and leaves
    /// all state as it was.
    pub async fn handle_connect(&self, session: SessionId, connection: ConnectionId) {
        let span = spans::lifecycle("connect", &connection);
        async {
            let state = self.registry.state(connection);

            if let Err(e) = self.registry.get_or_create_channel(connection, &state).await {
                warn!(connection = %connection, error = %e, "monitor channel setup failed on connect");
                self.notifier
                    .session_echo(session, &format!("ChanMon: Error creating channel: {e}"))
                    .await;
                return;
            }

            if let Err(e) = self.ensure_attached(connection, &state).await {
                // Attachment is retried on the next connect or toggle.
                warn!(connection = %connection, error = %e, "event listener attach failed");
            }
        }
        .instrument(span)
        .await
    }

    /// Handle the `chanmon` command.
    ///
    /// Flips the enabled flag and reports the new status to the invoking
    /// session; with arguments, additionally publishes the joined argument
    /// text as a manual monitor message tagged with the origin channel.
    /// Always returns `true`: the command is consumed here, and failures
    /// become echo lines rather than errors.
    pub async fn handle_command(&self, ctx: &CommandContext, args: &[String]) -> bool {
        let span = spans::command(&ctx.connection, &ctx.session);
        self.run_command(ctx, args).instrument(span).await
    }

    /// Reset transient state when the connection drops.
    ///
    /// The enabled flag survives; the channel handle and the listener
    /// attachment are rebuilt on the next connect, and the dedup window
    /// starts empty.
    pub async fn handle_disconnect(&self, connection: ConnectionId) {
        let span = spans::lifecycle("disconnect", &connection);
        async {
            let Some(state) = self.registry.get(connection) else {
                return;
            };
            let mut binding = state.binding.lock().await;
            binding.channel = None;
            binding.attach = AttachState::NotAttached;
            drop(binding);
            state.window.clear();
            debug!(connection = %connection, "monitor state reset");
        }
        .instrument(span)
        .await
    }

    /// Drop all monitor state for a connection the host is removing for
    /// good. The host drops its event subscription as part of the same
    /// removal.
    pub fn forget(&self, connection: ConnectionId) {
        self.registry.remove(connection);
        debug!(connection = %connection, "monitor state forgotten");
    }

    async fn run_command(&self, ctx: &CommandContext, args: &[String]) -> bool {
        let _timer = CommandTimer::start();
        let state = self.registry.state(ctx.connection);

        // Channel first: a failed creation aborts the command with the
        // enabled flag untouched.
        let channel = match self.registry.get_or_create_channel(ctx.connection, &state).await {
            Ok((channel, _created)) => channel,
            Err(e) => {
                warn!(connection = %ctx.connection, error = %e, "monitor channel setup failed");
                self.notifier
                    .session_echo(ctx.session, &format!("ChanMon: Error creating channel: {e}"))
                    .await;
                return true;
            }
        };

        if let Err(e) = self.ensure_attached(ctx.connection, &state).await {
            warn!(connection = %ctx.connection, error = %e, "event listener attach failed");
        }

        let enabled = state.toggle();
        metrics::record_toggle(enabled);
        info!(connection = %ctx.connection, enabled, "monitoring toggled");

        if args.is_empty() {
            self.notifier
                .session_echo(ctx.session, &status_text(enabled, &channel.name))
                .await;
        } else {
            // Manual additions bypass the filter: always published, never
            // fingerprinted.
            let text = args.join(" ");
            let message = MonitoredMessage::manual(&channel.name, &ctx.origin_channel, &text);
            match self.channels.append_message(ctx.connection, &channel, message).await {
                Ok(()) => {
                    self.notifier
                        .session_echo(
                            ctx.session,
                            &format!("ChanMon: Message added to {}: \"{text}\"", channel.name),
                        )
                        .await;
                }
                Err(e) => {
                    warn!(connection = %ctx.connection, error = %e, "manual message append failed");
                    self.notifier
                        .session_echo(ctx.session, &format!("ChanMon: Error adding message: {e}"))
                        .await;
                }
            }
        }

        true
    }

    /// Subscribe the engine to the connection's event stream, once.
    ///
    /// Runs under the binding lock so racing callers cannot
    /// double-subscribe. A failed subscribe leaves the state `NotAttached`
    /// for a later retry.
    async fn ensure_attached(
        &self,
        connection: ConnectionId,
        state: &MonitorState,
    ) -> Result<(), MonitorError> {
        let mut binding = state.binding.lock().await;
        if binding.attach == AttachState::Attached {
            return Ok(());
        }
        self.events.subscribe(connection, self.engine.clone()).await?;
        binding.attach = AttachState::Attached;
        debug!(connection = %connection, "event listener attached");
        Ok(())
    }
}

/// Session-local status line; never appended to the monitor channel.
fn status_text(enabled: bool, channel_name: &str) -> String {
    format!(
        "ChanMon: Automatic monitoring is {}. Messages from other channels will {} in {}.",
        if enabled { "ENABLED" } else { "DISABLED" },
        if enabled { "automatically appear" } else { "not appear" },
        channel_name
    )
}
