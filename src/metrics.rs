//! Prometheus metrics for the monitor engine.
//!
//! Tracks admission/drop throughput, channel creation, and toggle activity.
//! There is no exposition endpoint here; the embedding host scrapes via
//! [`gather_metrics`] and serves the text wherever its own metrics live.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Events admitted and appended to a monitor channel.
pub static EVENTS_ADMITTED: OnceLock<IntCounter> = OnceLock::new();

/// Events dropped, by reason. Labels are [`DropReason::code`] values plus
/// the [`MonitorError::error_code`] values for host-side failures.
///
/// [`DropReason::code`]: crate::filter::DropReason::code
/// [`MonitorError::error_code`]: crate::error::MonitorError::error_code
pub static EVENTS_DROPPED: OnceLock<IntCounterVec> = OnceLock::new();

/// Monitor channels created.
pub static CHANNELS_CREATED: OnceLock<IntCounter> = OnceLock::new();

/// Toggle transitions, by resulting state (`on`/`off`).
pub static TOGGLES: OnceLock<IntCounterVec> = OnceLock::new();

/// Toggle command latency.
pub static COMMAND_LATENCY: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at host startup before any metrics are recorded.
/// Recording before `init` is a silent no-op.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        EVENTS_ADMITTED,
        IntCounter::new("chanmon_events_admitted_total", "Events admitted to the monitor channel")
    );
    register!(
        EVENTS_DROPPED,
        IntCounterVec::new(
            Opts::new("chanmon_events_dropped_total", "Events dropped by reason"),
            &["reason"]
        )
    );
    register!(
        CHANNELS_CREATED,
        IntCounter::new("chanmon_channels_created_total", "Monitor channels created")
    );
    register!(
        TOGGLES,
        IntCounterVec::new(
            Opts::new("chanmon_toggles_total", "Toggle transitions by resulting state"),
            &["state"]
        )
    );
    register!(
        COMMAND_LATENCY,
        Histogram::with_opts(
            HistogramOpts::new("chanmon_command_duration_seconds", "Toggle command latency")
                .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5])
        )
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record one admitted event.
#[inline]
pub fn record_event_admitted() {
    if let Some(c) = EVENTS_ADMITTED.get() {
        c.inc();
    }
}

/// Record one dropped event.
#[inline]
pub fn record_event_dropped(reason: &str) {
    if let Some(c) = EVENTS_DROPPED.get() {
        c.with_label_values(&[reason]).inc();
    }
}

/// Record a monitor channel creation.
#[inline]
pub fn record_channel_created() {
    if let Some(c) = CHANNELS_CREATED.get() {
        c.inc();
    }
}

/// Record a toggle transition.
#[inline]
pub fn record_toggle(enabled: bool) {
    if let Some(c) = TOGGLES.get() {
        c.with_label_values(&[if enabled { "on" } else { "off" }]).inc();
    }
}

/// Record one toggle command execution.
#[inline]
pub fn record_command_duration(duration_secs: f64) {
    if let Some(h) = COMMAND_LATENCY.get() {
        h.observe(duration_secs);
    }
}
