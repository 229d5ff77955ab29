//! # Backoff between failed runs.
//!
//! [`BackoffPolicy`] bounds the delay applied after generic failures:
//! - [`BackoffPolicy::initial`] the delay after the first failure;
//! - [`BackoffPolicy::max`] the cap.
//!
//! Doubling is the only growth function. [`RestartState`] carries the current
//! value between runs and is owned by the supervision loop alone.
//!
//! After `n` consecutive failures the delay slept is `min(initial × 2^(n-1), max)`.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use swarmvisor::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//!
//! assert_eq!(backoff.next(0), Duration::from_secs(5));
//! assert_eq!(backoff.next(3), Duration::from_secs(40));
//! assert_eq!(backoff.grow(Duration::from_secs(200)), Duration::from_secs(300));
//! assert_eq!(backoff.next(100), Duration::from_secs(300));
//! ```

use std::time::Duration;

/// Retry backoff bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first failure, and the value every reset returns to.
    pub initial: Duration,
    /// Maximum delay cap.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    /// `initial = 5s`, `max = 5min`.
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(5),
            max: Duration::from_secs(5 * 60),
        }
    }
}

impl BackoffPolicy {
    /// Delay for the `failures`-th consecutive failure (0-indexed), clamped to `max`.
    pub fn next(&self, failures: u32) -> Duration {
        let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .map_or(self.max, |d| d.min(self.max))
    }

    /// Doubles `current`, clamped to `max`.
    pub fn grow(&self, current: Duration) -> Duration {
        current
            .checked_mul(2)
            .map_or(self.max, |d| d.min(self.max))
    }

    /// Starting value, clamped to `max`.
    pub fn reset(&self) -> Duration {
        self.initial.min(self.max)
    }
}

/// Current backoff and its bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestartState {
    current: Duration,
    bounds: BackoffPolicy,
}

impl RestartState {
    pub fn new(bounds: BackoffPolicy) -> Self {
        Self {
            current: bounds.reset(),
            bounds,
        }
    }

    /// Delay that the next generic failure would sleep.
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn bounds(&self) -> BackoffPolicy {
        self.bounds
    }

    /// Replaces the current value; kept within `[initial, max]`.
    pub(crate) fn set(&mut self, next: Duration) {
        self.current = next.clamp(self.bounds.reset(), self.bounds.max);
    }
}

impl Default for RestartState {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn closed_form_matches_repeated_doubling() {
        let policy = BackoffPolicy::default();
        let mut current = policy.reset();
        for n in 0..20 {
            assert_eq!(policy.next(n), current, "failure #{n}");
            assert!(current <= policy.max);
            current = policy.grow(current);
        }
    }

    #[test]
    fn growth_sequence_from_initial() {
        let policy = BackoffPolicy::default();
        let seq: Vec<Duration> = (0..8).map(|n| policy.next(n)).collect();
        assert_eq!(
            seq,
            [secs(5), secs(10), secs(20), secs(40), secs(80), secs(160), secs(300), secs(300)]
        );
    }

    #[test]
    fn huge_counts_clamp_to_max() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next(u32::MAX), policy.max);
        assert_eq!(policy.grow(Duration::MAX), policy.max);
    }

    #[test]
    fn initial_above_max_is_clamped() {
        let policy = BackoffPolicy {
            initial: secs(10),
            max: secs(5),
        };
        assert_eq!(policy.reset(), secs(5));
        assert_eq!(policy.next(0), secs(5));
        assert_eq!(RestartState::new(policy).current(), secs(5));
    }

    #[test]
    fn state_set_stays_within_bounds() {
        let mut state = RestartState::default();
        state.set(secs(1));
        assert_eq!(state.current(), secs(5));
        state.set(secs(3600));
        assert_eq!(state.current(), secs(300));
    }
}
