//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`] centralized settings for the supervision runtime.
//! The run configuration of the child itself lives in
//! [`RunConfiguration`](crate::process::RunConfiguration) and is passed to
//! [`Supervisor::run`](crate::Supervisor::run).

use crate::policies::RestartPolicy;
use crate::process::CleanerConfig;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `restart`: backoff bounds and the fixed delay after cleanup
/// - `cleaner`: patterns and timings of the stale-process cleanup
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `os_signals`: install SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows) handlers in `run`
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Restart policy applied after every run.
    pub restart: RestartPolicy,

    /// Settings of the default [`ProcessCleaner`](crate::process::ProcessCleaner).
    ///
    /// Ignored when a custom cleanup is injected through the builder.
    pub cleaner: CleanerConfig,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// A listener that lags behind more than `bus_capacity` messages
    /// skips older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Whether `run` listens for OS termination signals.
    ///
    /// When disabled, only [`Supervisor::shutdown`](crate::Supervisor::shutdown)
    /// or the cancellation token stop the loop.
    pub os_signals: bool,
}

impl SupervisorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `restart = RestartPolicy::default()` (5s..5min doubling, 10s after cleanup)
    /// - `cleaner = CleanerConfig::default()` (`gensyn`/`hivemind`, grace 2s, settle 1s)
    /// - `bus_capacity = 1024`
    /// - `os_signals = true`
    fn default() -> Self {
        Self {
            restart: RestartPolicy::default(),
            cleaner: CleanerConfig::default(),
            bus_capacity: 1024,
            os_signals: true,
        }
    }
}
