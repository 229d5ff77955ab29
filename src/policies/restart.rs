//! # Restart decisions.
//!
//! [`RestartPolicy::decide`] maps the outcome of a finished run and the current
//! backoff to the next action. It is pure: the supervisor applies the action and
//! stores the returned backoff.
//!
//! | Outcome                        | Action                          | Backoff after            |
//! |--------------------------------|---------------------------------|--------------------------|
//! | Clean                          | [`RestartAction::Immediate`]        | reset to `initial`       |
//! | GenericFailure                 | [`RestartAction::Backoff`] (current) | `min(current × 2, max)` |
//! | IdentityConflict (any marker)  | [`RestartAction::CleanupThenRetry`] | reset to `initial`       |
//!
//! ## States
//! ```text
//! Idle ─► Running ─► { ImmediateRetry | Backoff | CleanupAndRetry } ─► Running ─► ...
//!   └──────────┴──────────────────────┴─────────────────────────────────► ShuttingDown
//! ```
//! `ShuttingDown` is reached from any state through cancellation and is terminal.

use std::time::Duration;

use crate::process::ExitOutcome;

use super::backoff::{BackoffPolicy, RestartState};

/// What to do before the next run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartAction {
    /// Request the next run right away.
    Immediate,
    /// Sleep `delay`, then request the next run.
    Backoff { delay: Duration },
    /// Clean up stale processes, sleep `delay`, then request the next run.
    CleanupThenRetry { delay: Duration },
}

impl RestartAction {
    pub fn as_label(&self) -> &'static str {
        match self {
            RestartAction::Immediate => "immediate",
            RestartAction::Backoff { .. } => "backoff",
            RestartAction::CleanupThenRetry { .. } => "cleanup_then_retry",
        }
    }

    /// Sleep applied before the next run, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            RestartAction::Immediate => None,
            RestartAction::Backoff { delay } | RestartAction::CleanupThenRetry { delay } => {
                Some(*delay)
            }
        }
    }
}

/// Result of [`RestartPolicy::decide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub action: RestartAction,
    /// Backoff to store for the following cycle.
    pub next_backoff: Duration,
}

/// Restart policy of the supervision loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Bounds of the generic-failure backoff.
    pub backoff: BackoffPolicy,
    /// Fixed sleep after a cleanup.
    pub cleanup_delay: Duration,
}

impl Default for RestartPolicy {
    /// Backoff 5s..5min, cleanup delay 10s.
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            cleanup_delay: Duration::from_secs(10),
        }
    }
}

impl RestartPolicy {
    /// Decides the next action for `outcome` given the `current` backoff.
    pub fn decide(&self, outcome: &ExitOutcome, current: Duration) -> Decision {
        match outcome {
            ExitOutcome::Clean => Decision {
                action: RestartAction::Immediate,
                next_backoff: self.backoff.reset(),
            },
            ExitOutcome::GenericFailure(_) => Decision {
                action: RestartAction::Backoff { delay: current },
                next_backoff: self.backoff.grow(current),
            },
            ExitOutcome::IdentityConflict => Decision {
                action: RestartAction::CleanupThenRetry {
                    delay: self.cleanup_delay,
                },
                next_backoff: self.backoff.reset(),
            },
        }
    }

    /// Decides for `outcome` and stores the resulting backoff in `state`.
    pub fn advance(&self, state: &mut RestartState, outcome: &ExitOutcome) -> RestartAction {
        let decision = self.decide(outcome, state.current());
        state.set(decision.next_backoff);
        decision.action
    }

    /// Fresh loop state bounded by this policy.
    pub fn initial_state(&self) -> RestartState {
        RestartState::new(self.backoff)
    }
}
