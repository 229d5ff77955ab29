//! Result of one training-process lifetime.

use std::process::ExitStatus;

use crate::error::ExitError;

/// How a run ended, as seen by the restart policy.
#[derive(Debug)]
pub enum ExitOutcome {
    /// Exited successfully and no output line matched a marker.
    Clean,
    /// Some output line matched a marker. Wins over the exit status.
    IdentityConflict,
    /// Non-zero exit, wait failure, or the process could not be started.
    GenericFailure(ExitError),
}

impl ExitOutcome {
    /// Folds the shared classification flag and the wait result into an outcome.
    pub fn from_run(matched: bool, status: Result<ExitStatus, ExitError>) -> Self {
        if matched {
            return ExitOutcome::IdentityConflict;
        }
        match status {
            Ok(s) if s.success() => ExitOutcome::Clean,
            Ok(s) => ExitOutcome::GenericFailure(ExitError::Exited { code: s.code() }),
            Err(e) => ExitOutcome::GenericFailure(e),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExitOutcome::Clean => "clean",
            ExitOutcome::IdentityConflict => "identity_conflict",
            ExitOutcome::GenericFailure(_) => "generic_failure",
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ExitOutcome::Clean)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    fn status(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn match_wins_over_exit_status() {
        assert!(matches!(
            ExitOutcome::from_run(true, Ok(status(0))),
            ExitOutcome::IdentityConflict
        ));
        assert!(matches!(
            ExitOutcome::from_run(true, Ok(status(1))),
            ExitOutcome::IdentityConflict
        ));
    }

    #[test]
    fn unmatched_runs_follow_exit_status() {
        assert!(ExitOutcome::from_run(false, Ok(status(0))).is_clean());

        match ExitOutcome::from_run(false, Ok(status(3))) {
            ExitOutcome::GenericFailure(ExitError::Exited { code }) => assert_eq!(code, Some(3)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn wait_errors_are_generic_failures() {
        let err = ExitError::Wait {
            source: std::io::Error::other("gone"),
        };
        let outcome = ExitOutcome::from_run(false, Err(err));
        assert_eq!(outcome.label(), "generic_failure");
    }
}
