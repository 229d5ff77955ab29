//! # Runtime events emitted by the supervisor, launcher and cleaner.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Supervisor events**: start, shutdown request, stop
//! - **Run events**: one child-process lifetime (starting, spawned, marker, exited)
//! - **Policy events**: what the restart policy decided (immediate, backoff, cleanup)
//! - **Cleanup events**: results of stale-process cleanup
//!
//! The [`Event`] struct carries additional metadata such as timestamps, attempt
//! number, delays and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use swarmvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(20))
//!     .with_backoff(Duration::from_secs(40))
//!     .with_reason("exit code 1");
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.delay_ms, Some(20_000));
//! assert_eq!(ev.reason.as_deref(), Some("exit code 1"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::process::{MarkerKind, StreamKind};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Supervisor events ===
    /// Supervision loop started.
    ///
    /// Sets:
    /// - `reason`: build metadata
    SupervisorStarted,

    /// Shutdown requested (OS signal observed or explicit cancel).
    ShutdownRequested,

    /// Supervision loop exited; no further restarts will be issued.
    SupervisorStopped,

    // === Run events ===
    /// A run of the training process is about to start.
    ///
    /// Sets:
    /// - `attempt`: run number (1-based, never resets)
    RunStarting,

    /// The child process was spawned.
    ///
    /// Sets:
    /// - `attempt`: run number
    /// - `pid`: child pid (if the OS reported one)
    ChildSpawned,

    /// A line of child output matched a failure marker.
    ///
    /// Sets:
    /// - `attempt`: run number
    /// - `stream`: stdout or stderr
    /// - `marker`: kind of the matched marker
    /// - `reason`: the matched line
    MarkerMatched,

    /// The child exited and its outcome was classified.
    ///
    /// Sets:
    /// - `attempt`: run number
    /// - `outcome`: outcome label
    /// - `reason`: failure message (failures only)
    RunExited,

    // === Policy events ===
    /// Next run requested without delay after a clean exit.
    ///
    /// Sets:
    /// - `attempt`: previous run number
    /// - `backoff_ms`: backoff after the decision (reset to initial)
    RestartImmediate,

    /// Next run delayed by the current backoff after a generic failure.
    ///
    /// Sets:
    /// - `attempt`: previous run number
    /// - `delay_ms`: sleep before the next run
    /// - `backoff_ms`: backoff after the decision (doubled, capped)
    /// - `reason`: failure message
    BackoffScheduled,

    /// Marker matched; stale processes will be cleaned before retrying.
    ///
    /// Sets:
    /// - `attempt`: previous run number
    /// - `delay_ms`: fixed sleep after cleanup
    /// - `backoff_ms`: backoff after the decision (reset to initial)
    CleanupScheduled,

    /// A restart request was dropped because one is already pending.
    RestartCoalesced,

    // === Cleanup events ===
    /// Stale-process cleanup finished.
    ///
    /// Sets:
    /// - `reason`: summary of terminated / force-killed processes
    CleanupFinished,

    /// A cleanup step failed; cleanup continued.
    ///
    /// Sets:
    /// - `pid`: affected process, if any
    /// - `reason`: failure message
    CleanupWarning,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::SupervisorStarted => "supervisor_started",
            EventKind::ShutdownRequested => "shutdown_requested",
            EventKind::SupervisorStopped => "supervisor_stopped",
            EventKind::RunStarting => "run_starting",
            EventKind::ChildSpawned => "child_spawned",
            EventKind::MarkerMatched => "marker_matched",
            EventKind::RunExited => "run_exited",
            EventKind::RestartImmediate => "restart_immediate",
            EventKind::BackoffScheduled => "backoff_scheduled",
            EventKind::CleanupScheduled => "cleanup_scheduled",
            EventKind::RestartCoalesced => "restart_coalesced",
            EventKind::CleanupFinished => "cleanup_finished",
            EventKind::CleanupWarning => "cleanup_warning",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Run number (starting from 1).
    pub attempt: Option<u64>,
    /// Sleep before the next run in milliseconds.
    pub delay_ms: Option<u64>,
    /// Backoff value after a policy decision in milliseconds.
    pub backoff_ms: Option<u64>,
    /// Process id, if applicable.
    pub pid: Option<u32>,
    /// Output stream a line came from.
    pub stream: Option<StreamKind>,
    /// Kind of the marker that matched.
    pub marker: Option<MarkerKind>,
    /// Outcome label of a finished run.
    pub outcome: Option<&'static str>,
    /// Human-readable reason (errors, matched lines, summaries).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            delay_ms: None,
            backoff_ms: None,
            pid: None,
            stream: None,
            marker: None,
            outcome: None,
            reason: None,
        }
    }

    /// Attaches a run number.
    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a sleep duration (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(duration_ms(d));
        self
    }

    /// Attaches the backoff value after a decision (stored as milliseconds).
    #[inline]
    pub fn with_backoff(mut self, d: Duration) -> Self {
        self.backoff_ms = Some(duration_ms(d));
        self
    }

    /// Attaches a process id.
    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches the output stream.
    #[inline]
    pub fn with_stream(mut self, stream: StreamKind) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Attaches the matched marker kind.
    #[inline]
    pub fn with_marker(mut self, marker: MarkerKind) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Attaches an outcome label.
    #[inline]
    pub fn with_outcome(mut self, outcome: &'static str) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
