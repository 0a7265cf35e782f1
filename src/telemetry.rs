//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing toggle command execution.
///
/// Records command latency when dropped, so every exit path of the command
/// is measured.
pub struct CommandTimer {
    start: Instant,
}

impl CommandTimer {
    /// Start timing the command.
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        crate::metrics::record_command_duration(self.start.elapsed().as_secs_f64());
    }
}

/// Standardized span constructors for monitor observability.
pub mod spans {
    use crate::host::{ConnectionId, SessionId};
    use tracing::{Span, info_span};

    /// Create a span for a toggle command invocation.
    pub fn command(connection: &ConnectionId, session: &SessionId) -> Span {
        info_span!("chanmon_command", connection = %connection, session = %session)
    }

    /// Create a span for a connection's lifecycle transition.
    pub fn lifecycle(stage: &'static str, connection: &ConnectionId) -> Span {
        info_span!("chanmon_lifecycle", stage = stage, connection = %connection)
    }
}
