//! # Output classification for the training process.
//!
//! [`OutputClassifier`] inspects single lines of child output and reports whether
//! they match one of the known failure markers. Both output readers of a run share
//! one [`ConflictFlag`]; the first match raises it and it stays raised until the
//! run is over.
//!
//! Matching is a case-insensitive substring search. Generic error markers and the
//! identity-conflict marker lead to the same recovery (cleanup, then retry); the
//! [`MarkerKind`] is kept only so the log says which one fired.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which pipe of the child a line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Family of a failure marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Trainer error banners and Python exception output.
    Generic,
    /// The identity is still registered by a previous (stale) peer.
    IdentityConflict,
}

impl MarkerKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            MarkerKind::Generic => "generic",
            MarkerKind::IdentityConflict => "identity_conflict",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A substring that flags a line as relevant for failure classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub pattern: &'static str,
    pub kind: MarkerKind,
}

impl Marker {
    pub const fn generic(pattern: &'static str) -> Self {
        Self {
            pattern,
            kind: MarkerKind::Generic,
        }
    }

    pub const fn conflict(pattern: &'static str) -> Self {
        Self {
            pattern,
            kind: MarkerKind::IdentityConflict,
        }
    }
}

/// Marker set recognised in the trainer's output.
pub const DEFAULT_MARKERS: &[Marker] = &[
    Marker::generic(">> An error was detected while running rl-swarm."),
    Marker::generic(">> Shutting down trainer..."),
    Marker::generic("Error:"),
    Marker::generic("Exception:"),
    Marker::generic("Traceback:"),
    Marker::conflict("is already taken by another user"),
];

/// Case-insensitive substring matcher over a fixed marker set.
#[derive(Debug, Clone)]
pub struct OutputClassifier {
    markers: Vec<(String, Marker)>,
}

impl OutputClassifier {
    /// Builds a classifier over `markers`; patterns are lowercased once here.
    pub fn new(markers: impl IntoIterator<Item = Marker>) -> Self {
        let markers = markers
            .into_iter()
            .map(|m| (m.pattern.to_lowercase(), m))
            .collect();
        Self { markers }
    }

    /// Returns true if `line` contains any marker.
    pub fn classify(&self, line: &str) -> bool {
        self.find(line).is_some()
    }

    /// Returns the first marker contained in `line`, in declaration order.
    pub fn find(&self, line: &str) -> Option<&Marker> {
        if line.is_empty() {
            return None;
        }
        let lowered = line.to_lowercase();
        self.markers
            .iter()
            .find(|(needle, _)| lowered.contains(needle.as_str()))
            .map(|(_, marker)| marker)
    }
}

impl Default for OutputClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS.iter().cloned())
    }
}

/// Per-run classification flag shared by the output readers.
///
/// Raising is one-way; a new flag is created for every run.
#[derive(Debug, Clone, Default)]
pub struct ConflictFlag(Arc<AtomicBool>);

impl ConflictFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Returns true only for the call that raised it first.
    pub fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_markers_case_insensitively() {
        let c = OutputClassifier::default();
        assert!(c.classify(">> An error was detected while running rl-swarm."));
        assert!(c.classify("ERROR: cuda out of memory"));
        assert!(c.classify("  traceback: (most recent call last)"));
        assert!(c.classify("RuntimeException: boom"));
        assert!(!c.classify("step 120 loss=0.31"));
        assert!(!c.classify(""));
    }

    #[test]
    fn reports_marker_kind() {
        let c = OutputClassifier::default();
        let m = c
            .find("peer QmXyz is already taken by another user")
            .expect("conflict marker");
        assert_eq!(m.kind, MarkerKind::IdentityConflict);

        let m = c.find(">> Shutting down trainer...").expect("generic marker");
        assert_eq!(m.kind, MarkerKind::Generic);
    }

    #[test]
    fn custom_marker_set() {
        let c = OutputClassifier::new([Marker::conflict("Address In Use")]);
        assert!(c.classify("bind: address in use"));
        assert!(!c.classify("Error: something else"));
    }

    #[test]
    fn flag_is_raised_once_across_threads() {
        let flag = ConflictFlag::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flag = flag.clone();
                std::thread::spawn(move || flag.raise())
            })
            .collect();

        let firsts = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .filter(|first| *first)
            .count();

        assert_eq!(firsts, 1);
        assert!(flag.is_raised());
        assert!(!flag.raise());
    }
}
