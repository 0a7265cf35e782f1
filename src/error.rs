//! Unified error handling for chanmon.
//!
//! Host-facing operations surface a single error enum with static codes for
//! metric labeling. Filter drops are not errors; they are verdicts carrying a
//! [`DropReason`](crate::filter::DropReason).

use thiserror::Error;

/// Errors that can occur while driving the host on the monitor's behalf.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The host refused to create the monitor channel.
    #[error("monitor channel creation failed: {0}")]
    ChannelCreation(String),

    /// The connection's event stream cannot be subscribed to yet.
    ///
    /// Non-fatal: attachment stays pending and is retried on the next
    /// connect or toggle.
    #[error("event source unavailable: {0}")]
    EventSourceUnavailable(String),

    /// The host rejected an append to the monitor channel.
    #[error("message append failed: {0}")]
    Append(String),
}

impl MonitorError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ChannelCreation(_) => "channel_creation",
            Self::EventSourceUnavailable(_) => "event_source_unavailable",
            Self::Append(_) => "append",
        }
    }
}

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
