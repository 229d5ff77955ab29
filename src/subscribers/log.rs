//! # LogWriter: event printer backed by `tracing`
//!
//! Forwards incoming [`Event`]s to the process-wide `tracing` subscriber so
//! they land on the console next to the rest of the supervisor's diagnostics.
//! Failure-type events are emitted at `warn`, the rest at `info`.
//!
//! ## Example output
//! ```text
//! INFO  run_starting attempt=1
//! INFO  child_spawned attempt=1 pid=4242
//! WARN  marker_matched attempt=1 stream=stderr marker=identity_conflict reason="peer is already taken by another user"
//! WARN  run_exited attempt=1 outcome=identity_conflict
//! WARN  cleanup_scheduled attempt=1 delay_ms=10000 backoff_ms=5000
//! ```

use std::fmt::Write as _;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let fields = render_fields(e);
        match e.kind {
            EventKind::MarkerMatched
            | EventKind::BackoffScheduled
            | EventKind::CleanupScheduled
            | EventKind::CleanupWarning => {
                warn!("{}{}", e.kind.as_label(), fields);
            }
            EventKind::RunExited if e.outcome != Some("clean") => {
                warn!("{}{}", e.kind.as_label(), fields);
            }
            _ => {
                info!("{}{}", e.kind.as_label(), fields);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

/// Renders the populated optional fields of an event as ` key=value` pairs.
///
/// Empty when the event carries no metadata.
pub(crate) fn render_fields(e: &Event) -> String {
    let mut out = String::new();
    if let Some(n) = e.attempt {
        let _ = write!(out, " attempt={n}");
    }
    if let Some(pid) = e.pid {
        let _ = write!(out, " pid={pid}");
    }
    if let Some(stream) = e.stream {
        let _ = write!(out, " stream={stream}");
    }
    if let Some(marker) = e.marker {
        let _ = write!(out, " marker={marker}");
    }
    if let Some(outcome) = e.outcome {
        let _ = write!(out, " outcome={outcome}");
    }
    if let Some(ms) = e.delay_ms {
        let _ = write!(out, " delay_ms={ms}");
    }
    if let Some(ms) = e.backoff_ms {
        let _ = write!(out, " backoff_ms={ms}");
    }
    if let Some(reason) = e.reason.as_deref() {
        let _ = write!(out, " reason={reason:?}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MarkerKind, StreamKind};
    use std::time::Duration;

    #[test]
    fn renders_only_present_fields() {
        assert_eq!(render_fields(&Event::new(EventKind::SupervisorStopped)), "");

        let ev = Event::new(EventKind::MarkerMatched)
            .with_attempt(3)
            .with_stream(StreamKind::Stdout)
            .with_marker(MarkerKind::Generic)
            .with_reason("Traceback: boom");
        assert_eq!(
            render_fields(&ev),
            " attempt=3 stream=stdout marker=generic reason=\"Traceback: boom\""
        );
    }

    #[test]
    fn renders_durations_in_millis() {
        let ev = Event::new(EventKind::BackoffScheduled)
            .with_delay(Duration::from_secs(5))
            .with_backoff(Duration::from_secs(10));
        assert_eq!(render_fields(&ev), " delay_ms=5000 backoff_ms=10000");
    }
}
