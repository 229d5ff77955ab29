//! Restart and backoff policies.
//!
//! This module groups the knobs that control **how** the training process is
//! restarted and **how long** to wait between runs.
//!
//! ## Contents
//! - [`RestartPolicy`] outcome → [`RestartAction`] + next backoff (pure)
//! - [`BackoffPolicy`] doubling bounds (initial / max)
//! - [`RestartState`]  current backoff carried between runs
//!
//! ## Quick wiring
//! ```text
//! SupervisorConfig { restart: RestartPolicy, .. }
//!      └─► core::Supervisor loop:
//!           - policy.advance(&mut state, &outcome) after each run
//!           - applies Immediate / Backoff / CleanupThenRetry
//! ```
//!
//! ## Defaults
//! - backoff initial=5s, max=5min, doubling
//! - cleanup delay=10s

mod backoff;
mod restart;

pub use backoff::{BackoffPolicy, RestartState};
pub use restart::{Decision, RestartAction, RestartPolicy};
