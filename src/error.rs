//! Error types used by the swarmvisor runtime and its collaborators.
//!
//! This module defines the error enums of the crate:
//!
//! - [`RuntimeError`]: errors raised by the supervision runtime itself.
//! - [`ExitError`]: why a single run of the training process did not end cleanly.
//! - [`ConfigError`]: an invalid run configuration.
//! - [`BootstrapError`]: the interpreter environment could not be prepared.
//!
//! All of them provide `as_label` for logs and event fields.

use std::{io, path::PathBuf};

use thiserror::Error;

/// # Errors produced by the swarmvisor runtime.
///
/// Child-process failures are never surfaced here: they are absorbed by the
/// restart loop. Only problems that prevent supervision from starting are.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// OS signal handlers could not be registered.
    #[error("failed to register shutdown signal handlers: {source}")]
    Signals {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use swarmvisor::RuntimeError;
    ///
    /// let err = RuntimeError::Signals { source: std::io::Error::other("denied") };
    /// assert_eq!(err.as_label(), "runtime_signals");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Signals { .. } => "runtime_signals",
        }
    }
}

/// # Reasons a run of the training process failed.
///
/// Spawn failures are retried with the same backoff as a crash of a running child.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ExitError {
    /// The child could not be started at all.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that was being executed.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Waiting for the child failed.
    #[error("failed to wait for training process: {source}")]
    Wait {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The child exited with a non-success status.
    ///
    /// `code` is `None` when the child was terminated by a signal.
    #[error(
        "training process exited unsuccessfully ({})",
        .code.map_or_else(|| "terminated by signal".to_string(), |c| format!("code {c}"))
    )]
    Exited {
        /// Exit code, if the child exited normally.
        code: Option<i32>,
    },
}

impl ExitError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExitError::Spawn { .. } => "exit_spawn_failed",
            ExitError::Wait { .. } => "exit_wait_failed",
            ExitError::Exited { .. } => "exit_unsuccessful",
        }
    }
}

/// # Errors produced while resolving a run configuration.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Model size is not one of the supported parameter counts.
    #[error("invalid model size: {value} (must be one of {allowed:?})")]
    InvalidModelSize {
        /// Rejected value.
        value: String,
        /// Accepted values.
        allowed: &'static [&'static str],
    },

    /// Game is not one of the supported game types.
    #[error("invalid game: {value} (must be one of {allowed:?})")]
    InvalidGame {
        /// Rejected value.
        value: String,
        /// Accepted values.
        allowed: &'static [&'static str],
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidModelSize { .. } => "config_invalid_model_size",
            ConfigError::InvalidGame { .. } => "config_invalid_game",
        }
    }
}

/// # Errors produced while preparing the interpreter environment.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The interpreter does not exist where it is expected.
    #[error("interpreter not found at {}", .path.display())]
    InterpreterMissing {
        /// Expected interpreter location.
        path: PathBuf,
    },

    /// A bootstrap command could not be started.
    #[error("failed to run {program}: {source}")]
    Command {
        /// Program that was being executed.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A bootstrap command ran but reported failure.
    #[error("{step} failed with exit code {code:?}")]
    StepFailed {
        /// Human-readable step name.
        step: &'static str,
        /// Exit code, if any.
        code: Option<i32>,
    },

    /// The system interpreter is older than the trainer supports.
    #[error("python {required}+ required, found {found}")]
    PythonTooOld {
        /// Version reported by the interpreter.
        found: String,
        /// Minimum supported `major.minor`.
        required: &'static str,
    },

    /// The interpreter's version output could not be understood.
    #[error("unable to parse python version from {output:?}")]
    PythonVersionUnparsed {
        /// Raw `--version` output.
        output: String,
    },
}

impl BootstrapError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            BootstrapError::InterpreterMissing { .. } => "bootstrap_interpreter_missing",
            BootstrapError::Command { .. } => "bootstrap_command",
            BootstrapError::StepFailed { .. } => "bootstrap_step_failed",
            BootstrapError::PythonTooOld { .. } => "bootstrap_python_too_old",
            BootstrapError::PythonVersionUnparsed { .. } => "bootstrap_python_version_unparsed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exited_error_describes_code_and_signal() {
        let by_code = ExitError::Exited { code: Some(3) };
        assert_eq!(
            by_code.to_string(),
            "training process exited unsuccessfully (code 3)"
        );

        let by_signal = ExitError::Exited { code: None };
        assert_eq!(
            by_signal.to_string(),
            "training process exited unsuccessfully (terminated by signal)"
        );
        assert_eq!(by_signal.as_label(), "exit_unsuccessful");
    }

    #[test]
    fn spawn_error_names_program() {
        let err = ExitError::Spawn {
            program: "venv/bin/python".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().starts_with("failed to start venv/bin/python"));
        assert_eq!(err.as_label(), "exit_spawn_failed");
    }
}
