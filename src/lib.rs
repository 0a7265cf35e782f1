//! # chanmon
//!
//! A channel-monitor aggregation engine: mirrors filtered, deduplicated
//! copies of activity from every channel on a connection into one reserved
//! monitor channel, toggleable per connection with the `chanmon` command.
//!
//! ## Features
//!
//! - Uniform rewriting of messages and emotes (`[#chan] <nick> text`,
//!   `[#chan] * nick text`) with manual additions (`[#chan] <manual> text`)
//! - Duplicate suppression over a sliding window keyed by
//!   (source, author, text)
//! - Idempotent monitor-channel creation, safe under concurrent toggles
//! - Per-connection enabled state that survives session reconnects
//! - Host-agnostic integration through async traits
//!
//! ## Quick Start
//!
//! The embedding host implements [`EventSource`], [`ChannelHost`], and
//! [`SessionNotifier`], then drives a [`SessionCoordinator`] from its
//! connection lifecycle and command dispatch:
//!
//! ```no_run
//! use chanmon::{ConnectionId, MonitorConfig, SessionCoordinator, SessionId};
//! # use chanmon::{ChannelHost, ChannelRef, EventSink, EventSource, MonitorError,
//! #               MonitoredMessage, SessionNotifier};
//! # use async_trait::async_trait;
//! # use std::sync::Arc;
//! # struct Host;
//! # #[async_trait]
//! # impl EventSource for Host {
//! #     async fn subscribe(
//! #         &self,
//! #         _connection: ConnectionId,
//! #         _sink: Arc<dyn EventSink>,
//! #     ) -> Result<(), MonitorError> {
//! #         Ok(())
//! #     }
//! # }
//! # #[async_trait]
//! # impl ChannelHost for Host {
//! #     async fn find_channel(&self, _: ConnectionId, _: &str) -> Option<ChannelRef> {
//! #         None
//! #     }
//! #     async fn create_channel(
//! #         &self,
//! #         _: ConnectionId,
//! #         name: &str,
//! #         _: &str,
//! #     ) -> Result<ChannelRef, MonitorError> {
//! #         Ok(ChannelRef::new(1, name))
//! #     }
//! #     async fn append_message(
//! #         &self,
//! #         _: ConnectionId,
//! #         _: &ChannelRef,
//! #         _: MonitoredMessage,
//! #     ) -> Result<(), MonitorError> {
//! #         Ok(())
//! #     }
//! # }
//! # #[async_trait]
//! # impl SessionNotifier for Host {
//! #     async fn channel_joined(&self, _: ConnectionId, _: &ChannelRef) {}
//! #     async fn session_echo(&self, _: SessionId, _: &str) {}
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let host = Arc::new(Host);
//! let monitor = SessionCoordinator::new(
//!     MonitorConfig::default(),
//!     host.clone(),
//!     host.clone(),
//!     host.clone(),
//! );
//!
//! let session = SessionId::new_v4();
//! let connection = ConnectionId::new_v4();
//!
//! // Connection lifecycle.
//! monitor.handle_connect(session, connection).await;
//!
//! // Command dispatch: `/chanmon` toggles, `/chanmon some text` also adds
//! // a manual line.
//! let ctx = chanmon::CommandContext {
//!     session,
//!     connection,
//!     origin_channel: "#ops".to_string(),
//! };
//! monitor.handle_command(&ctx, &[]).await;
//! # }
//! ```
//!
//! Inbound events flow through the sink the coordinator subscribes on
//! connect; everything admitted by the filter is appended to the monitor
//! channel, and the append is the host's single notification trigger.

pub mod config;
pub mod coordinator;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod host;
pub mod metrics;
pub mod registry;
pub mod telemetry;

pub use self::config::{ConfigError, MonitorConfig};
pub use self::coordinator::{COMMAND_NAME, CommandContext, SessionCoordinator};
pub use self::dedup::{DedupWindow, Fingerprint};
pub use self::engine::AggregationEngine;
pub use self::error::{MonitorError, MonitorResult};
pub use self::event::{EventKind, MonitoredMessage, SourceEvent};
pub use self::filter::{DropReason, Verdict};
pub use self::host::{
    ChannelHost, ChannelId, ChannelRef, ConnectionId, EventSink, EventSource, SessionId,
    SessionNotifier,
};
pub use self::registry::{AttachState, MonitorRegistry, MonitorState};
