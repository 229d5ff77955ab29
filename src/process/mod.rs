//! # The supervised training process.
//!
//! Everything that touches the child process itself:
//!
//! - [`RunConfiguration`] / [`NetworkMode`] what to launch and with which arguments
//! - [`OutputClassifier`] / [`ConflictFlag`] per-line failure marker detection
//! - [`Launch`] / [`ProcessLauncher`] one run: spawn, read both streams, wait, classify
//! - [`ExitOutcome`] how a run ended
//! - [`Cleanup`] / [`ProcessCleaner`] removal of stale processes after a conflict
//!
//! [`Launch`] and [`Cleanup`] are the seams the supervisor is generic over; tests
//! swap in scripted implementations.

mod classifier;
mod cleaner;
mod launcher;
mod outcome;
mod spec;

pub use classifier::{ConflictFlag, DEFAULT_MARKERS, Marker, MarkerKind, OutputClassifier, StreamKind};
pub use cleaner::{CleanerConfig, Cleanup, CleanupReport, ProcessCleaner, matches_patterns};
pub use launcher::{Launch, ProcessLauncher};
pub use outcome::ExitOutcome;
pub use spec::{DEFAULT_ENTRYPOINT, NetworkMode, RunConfiguration};
