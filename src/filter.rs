//! Admission rules for inbound channel events.
//!
//! [`evaluate`] is a pure decision function over one event and the current
//! monitor state: it either rewrites the event into the message to mirror,
//! or names the reason it was dropped. Call sites own all side effects
//! (logging, metrics, the append itself).

use crate::dedup::{DedupWindow, Fingerprint};
use crate::event::{EventKind, MonitoredMessage, SourceEvent};

/// Why an event was not mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Monitoring is switched off for this connection.
    Disabled,
    /// Event is missing its source channel or author.
    Malformed,
    /// Event originated in the monitor channel itself.
    SelfLoop,
    /// Joins, parts, quits, and other state changes are not mirrored.
    SystemEvent,
    /// Source is not a channel (direct message or server notice).
    NonChannelSource,
    /// Identical event already admitted within the dedup window.
    Duplicate,
}

impl DropReason {
    /// Static label for metrics.
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Malformed => "malformed",
            Self::SelfLoop => "self_loop",
            Self::SystemEvent => "system_event",
            Self::NonChannelSource => "non_channel_source",
            Self::Duplicate => "duplicate",
        }
    }
}

/// Outcome of filter evaluation.
#[derive(Debug)]
pub enum Verdict {
    /// Mirror this rewritten message into the monitor channel.
    Admitted(MonitoredMessage),
    /// Do nothing observable.
    Dropped(DropReason),
}

/// Decide whether `event` is mirrored, and compute the rewritten message.
///
/// Rules run cheapest-first, and the dedup window is consulted last so that
/// events rejected by an earlier rule never consume a window slot. The
/// self-loop rule holds whether or not monitoring is enabled; with
/// monitoring disabled the verdict is simply `Dropped(Disabled)` first.
pub fn evaluate(
    event: &SourceEvent,
    enabled: bool,
    monitor_channel: &str,
    window: &DedupWindow,
) -> Verdict {
    if !enabled {
        return Verdict::Dropped(DropReason::Disabled);
    }
    if event.source_channel.is_empty() || event.author.is_empty() {
        return Verdict::Dropped(DropReason::Malformed);
    }
    if event.source_channel == monitor_channel {
        return Verdict::Dropped(DropReason::SelfLoop);
    }
    if event.kind.is_system() {
        return Verdict::Dropped(DropReason::SystemEvent);
    }
    if !is_channel_name(&event.source_channel) {
        return Verdict::Dropped(DropReason::NonChannelSource);
    }

    let fingerprint = Fingerprint::new(&event.source_channel, &event.author, &event.text);
    if !window.admit(fingerprint) {
        return Verdict::Dropped(DropReason::Duplicate);
    }

    let message = match event.kind {
        EventKind::Action => {
            MonitoredMessage::action(monitor_channel, &event.source_channel, &event.author, &event.text)
        }
        _ => MonitoredMessage::message(monitor_channel, &event.source_channel, &event.author, &event.text),
    };
    Verdict::Admitted(message)
}

/// Channel names carry a channel sigil.
fn is_channel_name(name: &str) -> bool {
    name.starts_with('#') || name.starts_with('&')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn window() -> DedupWindow {
        DedupWindow::new(Duration::from_secs(5))
    }

    fn assert_dropped(verdict: Verdict, reason: DropReason) {
        match verdict {
            Verdict::Dropped(r) => assert_eq!(r, reason),
            Verdict::Admitted(msg) => panic!("expected drop, admitted: {}", msg.text),
        }
    }

    #[test]
    fn test_admits_message() {
        let event = SourceEvent::message("#dev", "alice", "build broke");
        match evaluate(&event, true, "chanmon", &window()) {
            Verdict::Admitted(msg) => assert_eq!(msg.text, "[#dev] <alice> build broke"),
            Verdict::Dropped(reason) => panic!("dropped: {:?}", reason),
        }
    }

    #[test]
    fn test_admits_action() {
        let event = SourceEvent::action("#dev", "alice", "waves");
        match evaluate(&event, true, "chanmon", &window()) {
            Verdict::Admitted(msg) => assert_eq!(msg.text, "[#dev] * alice waves"),
            Verdict::Dropped(reason) => panic!("dropped: {:?}", reason),
        }
    }

    #[test]
    fn test_disabled_drops_everything() {
        let event = SourceEvent::message("#dev", "alice", "hi");
        assert_dropped(evaluate(&event, false, "chanmon", &window()), DropReason::Disabled);
    }

    #[test]
    fn test_self_loop_excluded() {
        let event = SourceEvent::message("chanmon", "alice", "hi");
        assert_dropped(evaluate(&event, true, "chanmon", &window()), DropReason::SelfLoop);
    }

    #[test]
    fn test_self_loop_with_sigil_named_monitor() {
        // A host may configure a #-prefixed monitor channel; the name check
        // must still catch it before the channel-sigil rule admits it.
        let event = SourceEvent::message("#chanmon", "alice", "hi");
        assert_dropped(evaluate(&event, true, "#chanmon", &window()), DropReason::SelfLoop);
    }

    #[test]
    fn test_system_events_excluded() {
        for kind in [
            EventKind::Join,
            EventKind::Part,
            EventKind::Quit,
            EventKind::NickChange,
            EventKind::ModeChange,
            EventKind::TopicChange,
        ] {
            let event = SourceEvent {
                source_channel: "#dev".into(),
                author: "alice".into(),
                text: String::new(),
                kind,
            };
            assert_dropped(evaluate(&event, true, "chanmon", &window()), DropReason::SystemEvent);
        }
    }

    #[test]
    fn test_non_channel_source_excluded() {
        let event = SourceEvent::message("alice", "alice", "psst");
        assert_dropped(evaluate(&event, true, "chanmon", &window()), DropReason::NonChannelSource);
    }

    #[test]
    fn test_ampersand_channels_admitted() {
        let event = SourceEvent::message("&local", "alice", "hi");
        assert!(matches!(evaluate(&event, true, "chanmon", &window()), Verdict::Admitted(_)));
    }

    #[test]
    fn test_malformed_dropped() {
        let no_source = SourceEvent::message("", "alice", "hi");
        assert_dropped(evaluate(&no_source, true, "chanmon", &window()), DropReason::Malformed);

        let no_author = SourceEvent::message("#dev", "", "hi");
        assert_dropped(evaluate(&no_author, true, "chanmon", &window()), DropReason::Malformed);
    }

    #[test]
    fn test_duplicate_suppressed() {
        let w = window();
        let event = SourceEvent::message("#dev", "alice", "hi");
        assert!(matches!(evaluate(&event, true, "chanmon", &w), Verdict::Admitted(_)));
        assert_dropped(evaluate(&event, true, "chanmon", &w), DropReason::Duplicate);
    }

    #[test]
    fn test_earlier_rules_skip_dedup() {
        let w = window();
        let from_monitor = SourceEvent::message("chanmon", "alice", "hi");
        assert_dropped(evaluate(&from_monitor, true, "chanmon", &w), DropReason::SelfLoop);
        assert_eq!(w.tracked(), 0);

        // The same content from a real channel is still fresh.
        let event = SourceEvent::message("#dev", "alice", "hi");
        assert!(matches!(evaluate(&event, true, "chanmon", &w), Verdict::Admitted(_)));
    }

    #[test]
    fn test_message_and_action_share_fingerprint_space() {
        // Kind is not part of the fingerprint: the same (source, author,
        // text) arriving as both message and action within the window
        // counts as a retransmission.
        let w = window();
        let msg = SourceEvent::message("#dev", "alice", "waves");
        let act = SourceEvent::action("#dev", "alice", "waves");
        assert!(matches!(evaluate(&msg, true, "chanmon", &w), Verdict::Admitted(_)));
        assert_dropped(evaluate(&act, true, "chanmon", &w), DropReason::Duplicate);
    }
}
